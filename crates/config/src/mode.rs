//! Serverless environment detection.
//!
//! Some hosts (function-as-a-service platforms, read-only containers) give
//! the process no reliable place to persist files. When that is the case,
//! the resolver must not touch the configuration directory at all.
//!
//! Detection runs through these checks, first match wins:
//!
//! 1. [`SERVERLESS_VAR`](crate::env::SERVERLESS_VAR) set to a recognized flag
//! 2. Any of [`SERVERLESS_INDICATORS`] set to a non-empty value
//! 3. A marker file cannot be created and removed in the home directory
//! 4. Otherwise the environment is persistent

use std::path::Path;
use std::sync::OnceLock;

use crate::env::{Environment, ProcessEnv, SERVERLESS_VAR, parse_flag};

/// Variables whose presence identifies a known hosting platform.
pub const SERVERLESS_INDICATORS: &[&str] = &[
    "AWS_LAMBDA_FUNCTION_NAME",       // AWS Lambda
    "GOOGLE_CLOUD_PROJECT",           // Google Cloud Functions
    "AZURE_FUNCTIONS_WORKER_RUNTIME", // Azure Functions
    "VERCEL",
    "NETLIFY",
    "SCW_FUNCTION_NAME", // Scaleway Functions
    "RAILWAY_ENVIRONMENT",
    "RENDER",
];

/// Name of the file created and removed by the write probe.
pub const WRITE_PROBE_FILE: &str = ".herbie_write_test";

/// Whether the process may rely on persistent, writable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentMode {
    /// Files written now will still be there later.
    Persistent,
    /// No reliable persistent storage; avoid writes.
    Serverless,
}

impl EnvironmentMode {
    /// Returns `true` for [`EnvironmentMode::Serverless`].
    #[must_use]
    pub const fn is_serverless(self) -> bool {
        matches!(self, Self::Serverless)
    }
}

impl std::fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistent => f.write_str("persistent"),
            Self::Serverless => f.write_str("serverless"),
        }
    }
}

/// Interprets a value of the serverless override variable.
///
/// # Examples
///
/// ```
/// use herbie_config::mode::{EnvironmentMode, parse_override};
///
/// assert_eq!(parse_override("Yes"), Some(EnvironmentMode::Serverless));
/// assert_eq!(parse_override("0"), Some(EnvironmentMode::Persistent));
/// assert_eq!(parse_override("auto"), None);
/// ```
#[must_use]
pub fn parse_override(value: &str) -> Option<EnvironmentMode> {
    parse_flag(value).map(|serverless| {
        if serverless {
            EnvironmentMode::Serverless
        } else {
            EnvironmentMode::Persistent
        }
    })
}

/// Classifies the real process environment.
///
/// The answer is computed on first call and reused for the rest of the
/// process, even if the environment changes afterwards.
pub fn classify() -> EnvironmentMode {
    static MODE: OnceLock<EnvironmentMode> = OnceLock::new();
    *MODE.get_or_init(|| classify_with(&ProcessEnv))
}

/// Classifies the given environment without caching.
///
/// # Examples
///
/// ```
/// use herbie_config::env::MapEnv;
/// use herbie_config::mode::{EnvironmentMode, classify_with};
///
/// let env = MapEnv::new().with_var("VERCEL", "1");
/// assert_eq!(classify_with(&env), EnvironmentMode::Serverless);
///
/// let env = env.with_var("HERBIE_SERVERLESS", "false");
/// assert_eq!(classify_with(&env), EnvironmentMode::Persistent);
/// ```
pub fn classify_with(env: &impl Environment) -> EnvironmentMode {
    if let Some(mode) = env.var(SERVERLESS_VAR).and_then(|v| parse_override(&v)) {
        tracing::debug!(%mode, "serverless mode set explicitly");
        return mode;
    }

    if let Some(indicator) = SERVERLESS_INDICATORS
        .iter()
        .find(|name| env.var(name).is_some_and(|value| !value.is_empty()))
    {
        tracing::debug!(indicator = *indicator, "serverless platform detected");
        return EnvironmentMode::Serverless;
    }

    let Some(home) = env.home_dir() else {
        tracing::debug!("no home directory, assuming serverless");
        return EnvironmentMode::Serverless;
    };

    match probe_writable(&home) {
        Ok(()) => EnvironmentMode::Persistent,
        Err(e) => {
            tracing::debug!(home = %home.display(), error = %e, "home directory not writable");
            EnvironmentMode::Serverless
        }
    }
}

/// Creates and immediately removes a marker file in `dir`.
fn probe_writable(dir: &Path) -> std::io::Result<()> {
    let marker = dir.join(WRITE_PROBE_FILE);
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&marker)?;
    std::fs::remove_file(&marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use tempfile::TempDir;

    fn writable_home() -> (TempDir, MapEnv) {
        let dir = TempDir::new().unwrap();
        let env = MapEnv::new().with_home(dir.path());
        (dir, env)
    }

    #[test]
    fn writable_home_is_persistent() {
        let (dir, env) = writable_home();
        assert_eq!(classify_with(&env), EnvironmentMode::Persistent);
        assert!(!dir.path().join(WRITE_PROBE_FILE).exists());
    }

    #[test]
    fn missing_home_dir_is_serverless() {
        assert_eq!(classify_with(&MapEnv::new()), EnvironmentMode::Serverless);
    }

    #[test]
    fn nonexistent_home_is_serverless() {
        let dir = TempDir::new().unwrap();
        let env = MapEnv::new().with_home(dir.path().join("gone"));
        assert_eq!(classify_with(&env), EnvironmentMode::Serverless);
    }

    #[test]
    fn truthy_override_wins_over_writable_home() {
        let (_dir, env) = writable_home();
        for value in ["true", "1", "yes", "TRUE"] {
            let env = env.clone().with_var(SERVERLESS_VAR, value);
            assert_eq!(classify_with(&env), EnvironmentMode::Serverless, "value: {value}");
        }
    }

    #[test]
    fn falsy_override_wins_over_indicators_and_unwritable_home() {
        for value in ["false", "0", "no", "No"] {
            let env = MapEnv::new()
                .with_var(SERVERLESS_VAR, value)
                .with_var("AWS_LAMBDA_FUNCTION_NAME", "handler");
            assert_eq!(classify_with(&env), EnvironmentMode::Persistent, "value: {value}");
        }
    }

    #[test]
    fn unrecognized_override_falls_through() {
        let (_dir, env) = writable_home();
        let env = env.with_var(SERVERLESS_VAR, "auto");
        assert_eq!(classify_with(&env), EnvironmentMode::Persistent);

        let env = env.with_var("NETLIFY", "true");
        assert_eq!(classify_with(&env), EnvironmentMode::Serverless);
    }

    #[test]
    fn every_indicator_triggers_serverless() {
        let (_dir, env) = writable_home();
        for indicator in SERVERLESS_INDICATORS {
            let env = env.clone().with_var(*indicator, "x");
            assert_eq!(classify_with(&env), EnvironmentMode::Serverless, "{indicator}");
        }
    }

    #[test]
    fn empty_indicator_is_ignored() {
        let (_dir, env) = writable_home();
        let env = env.with_var("RENDER", "");
        assert_eq!(classify_with(&env), EnvironmentMode::Persistent);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_home_is_serverless() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, env) = writable_home();
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores permission bits; only assert when the probe can fail
        let probe_fails = probe_writable(dir.path()).is_err();
        let mode = classify_with(&env);
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        if probe_fails {
            assert_eq!(mode, EnvironmentMode::Serverless);
        }
    }

    #[test]
    fn classify_is_memoized() {
        assert_eq!(classify(), classify());
    }

    #[test]
    fn display_names() {
        assert_eq!(EnvironmentMode::Persistent.to_string(), "persistent");
        assert_eq!(EnvironmentMode::Serverless.to_string(), "serverless");
        assert!(EnvironmentMode::Serverless.is_serverless());
        assert!(!EnvironmentMode::Persistent.is_serverless());
    }
}
