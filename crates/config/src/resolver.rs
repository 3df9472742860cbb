//! Startup configuration resolution.
//!
//! The resolver walks a fallback chain and always ends with a usable
//! [`Config`]:
//!
//! 1. Serverless environments get the embedded defaults with `save_dir` in
//!    the temp directory. Nothing is read from or written to disk.
//! 2. Otherwise the existing `config.toml` is loaded.
//! 3. If there is none, the configuration directory is populated and the new
//!    file is loaded.
//! 4. If loading or creating fails, the embedded defaults are used.
//!
//! In cases 2 to 4, `save_dir` is then expanded, and [`SAVE_DIR_VAR`]
//! replaces it when set.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::env::{Environment, ProcessEnv, SAVE_DIR_VAR};
use crate::error::Result;
use crate::expand::{ExpandOptions, expand_path, expand_user, expand_vars};
use crate::mode::{EnvironmentMode, classify, classify_with};
use crate::persistence::{ConfigPaths, read_config_file, write_default_files};
use crate::template::default_config;

/// Directory under the platform temp dir used as `save_dir` in serverless
/// mode.
pub const SERVERLESS_SAVE_DIR: &str = "herbie_temp";

/// Where a resolved configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Embedded defaults, serverless mode.
    Serverless,
    /// An existing configuration file.
    Existing,
    /// A configuration file created during resolution.
    Created,
    /// Embedded defaults after a failure.
    Default(DegradeReason),
}

/// Why the resolver fell back to the embedded defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    /// The configuration file exists but could not be read or parsed.
    LoadFailed,
    /// The configuration directory or its files could not be written.
    CreateFailed,
}

/// A resolved configuration together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The configuration.
    pub config: Config,
    /// The branch of the fallback chain that produced it.
    pub source: ConfigSource,
}

enum Stage {
    LoadExisting,
    CreateNew,
    Degrade(DegradeReason),
}

/// Resolves the process configuration against an [`Environment`].
///
/// # Examples
///
/// ```
/// use herbie_config::env::MapEnv;
/// use herbie_config::{ConfigSource, Resolver};
///
/// # fn example() -> herbie_config::Result<()> {
/// let env = MapEnv::new()
///     .with_var("HERBIE_SERVERLESS", "true")
///     .with_var("HERBIE_VERBOSE", "false")
///     .with_temp_dir("/tmp");
///
/// let resolution = Resolver::new(env).resolve_detailed()?;
/// assert_eq!(resolution.source, ConfigSource::Serverless);
/// assert!(resolution.config.serverless());
/// assert_eq!(resolution.config.save_dir(), std::path::Path::new("/tmp/herbie_temp"));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Resolver<E = ProcessEnv> {
    env: E,
    mode: EnvironmentMode,
    paths: ConfigPaths,
    verbose: bool,
}

impl Resolver<ProcessEnv> {
    /// A resolver for the real process, using the memoized classification.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::with_mode(ProcessEnv, classify())
    }
}

impl<E: Environment> Resolver<E> {
    /// Creates a resolver, classifying `env` on the spot.
    #[must_use]
    pub fn new(env: E) -> Self {
        let mode = classify_with(&env);
        Self::with_mode(env, mode)
    }

    /// Creates a resolver with a classification computed elsewhere.
    #[must_use]
    pub fn with_mode(env: E, mode: EnvironmentMode) -> Self {
        let paths = ConfigPaths::from_env(&env);
        let verbose = env.verbose();
        Self {
            env,
            mode,
            paths,
            verbose,
        }
    }

    /// The environment classification in use.
    #[must_use]
    pub fn mode(&self) -> EnvironmentMode {
        self.mode
    }

    /// The configuration file layout in use.
    #[must_use]
    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Resolves the configuration.
    ///
    /// # Errors
    ///
    /// Only [`ConfigError::TemplateCorruption`](crate::ConfigError::TemplateCorruption),
    /// which cannot happen with a correctly built crate. File system trouble
    /// always degrades to defaults instead.
    pub fn resolve(&self) -> Result<Config> {
        self.resolve_detailed().map(|resolution| resolution.config)
    }

    /// Resolves the configuration and reports which fallback was taken.
    ///
    /// # Errors
    ///
    /// Same as [`Resolver::resolve`].
    pub fn resolve_detailed(&self) -> Result<Resolution> {
        if self.mode.is_serverless() {
            return self.resolve_serverless();
        }

        let mut stage = Stage::LoadExisting;
        let (config, source) = loop {
            stage = match stage {
                Stage::LoadExisting => match read_config_file(&self.paths.file) {
                    Ok(config) => break (config, ConfigSource::Existing),
                    Err(e) if e.is_not_found() => Stage::CreateNew,
                    Err(e) => {
                        if self.verbose {
                            tracing::warn!(error = %e, "could not load config file");
                        }
                        Stage::Degrade(DegradeReason::LoadFailed)
                    }
                },
                Stage::CreateNew => match self.create_new() {
                    Ok((config, true)) => {
                        if self.verbose {
                            tracing::info!(path = %self.paths.file.display(), "created config file");
                        }
                        break (config, ConfigSource::Created);
                    }
                    Ok((config, false)) => break (config, ConfigSource::Existing),
                    Err(e) => {
                        tracing::debug!(error = %e, "config file creation failed");
                        if self.verbose {
                            tracing::warn!(
                                path = %self.paths.file.display(),
                                "using default config, could not write config file"
                            );
                        }
                        Stage::Degrade(DegradeReason::CreateFailed)
                    }
                },
                Stage::Degrade(reason) => break (default_config()?, ConfigSource::Default(reason)),
            };
        };

        Ok(Resolution {
            config: self.post_process(config),
            source,
        })
    }

    fn resolve_serverless(&self) -> Result<Resolution> {
        let mut config = default_config()?;
        config.default.serverless = true;
        config.default.save_dir = self.env.temp_dir().join(SERVERLESS_SAVE_DIR);

        if self.verbose {
            tracing::info!("running in serverless mode, using default config");
        }

        Ok(Resolution {
            config,
            source: ConfigSource::Serverless,
        })
    }

    /// Populates the configuration directory, then reads the file back.
    ///
    /// The flag is `false` when another process created the file first.
    fn create_new(&self) -> Result<(Config, bool)> {
        let created = write_default_files(&self.paths)?;
        let config = read_config_file(&self.paths.file)?;
        Ok((config, created))
    }

    fn post_process(&self, mut config: Config) -> Config {
        config.default.serverless = false;
        config.default.save_dir = self.expand_save_dir(&config.default.save_dir);

        if let Some(save_dir) = self.env.var_non_empty(SAVE_DIR_VAR) {
            if self.verbose {
                tracing::info!(save_dir = %save_dir, "using save_dir from {SAVE_DIR_VAR}");
            }
            config.default.save_dir = self.expand_save_dir(Path::new(&save_dir));
        }

        config
    }

    /// Expands and absolutizes; without a working directory the path is
    /// only expanded.
    fn expand_save_dir(&self, save_dir: &Path) -> PathBuf {
        expand_path(save_dir, ExpandOptions::new().absolute(), &self.env).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "could not absolutize save_dir");
            expand_user(&expand_vars(&save_dir.to_string_lossy(), &self.env), &self.env)
        })
    }
}
