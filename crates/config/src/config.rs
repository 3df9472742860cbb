//! Configuration data types.
//!
//! A configuration file holds one `[default]` table, read into [`Profile`].
//! Anything else in the file is kept as raw TOML so that nothing the user
//! wrote is lost, but it is not interpreted here.
//!
//! Known keys are read leniently: a value of the wrong type falls back to
//! that key's default and its siblings are kept.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::persistence::read_config_file;

/// The process-wide configuration.
///
/// # Examples
///
/// ```
/// use herbie_config::Config;
///
/// let config: Config = toml::from_str(
///     r#"
///     [default]
///     model = "gfs"
///     fxx = 6
///     priority = ["aws", "nomads"]
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.default.model, "gfs");
/// assert_eq!(config.default.fxx, 6);
/// assert!(config.default.verbose);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The `[default]` profile.
    #[serde(default)]
    pub default: Profile,

    /// Top-level tables other than `[default]`, untouched.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Config {
    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use herbie_config::Config;
    ///
    /// # fn example() -> herbie_config::Result<()> {
    /// let config = Config::load_from("/etc/herbie/config.toml")?;
    /// println!("default model: {}", config.default.model);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        read_config_file(path)
    }

    /// Shorthand for the directory model output is saved to.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.default.save_dir
    }

    /// Shorthand for the serverless flag.
    #[must_use]
    pub fn serverless(&self) -> bool {
        self.default.serverless
    }
}

/// Settings from the `[default]` table.
///
/// Missing keys, and keys holding a value of the wrong type, take the same
/// values as the embedded default config file.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use herbie_config::Config;
///
/// let config: Config = toml::from_str(
///     r#"
///     [default]
///     model = "gfs"
///     fxx = -1
///     save_dir = "/scratch/gribs"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.default.model, "gfs");
/// assert_eq!(config.default.fxx, 0);
/// assert_eq!(config.save_dir(), Path::new("/scratch/gribs"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "toml::Table")]
pub struct Profile {
    /// Model identifier, e.g. `hrrr`.
    pub model: String,

    /// Forecast lead time in hours.
    pub fxx: u32,

    /// Where downloaded files go.
    ///
    /// Fully expanded and absolute once the resolver hands the config out.
    pub save_dir: PathBuf,

    /// Re-download files that already exist locally.
    pub overwrite: bool,

    /// Print progress messages while downloading.
    pub verbose: bool,

    /// Data sources to check, in order.
    ///
    /// `None` means each model template's own order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,

    /// Set by the resolver. Values from the file are ignored.
    pub serverless: bool,

    /// Unrecognized keys, untouched.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            model: "hrrr".to_string(),
            fxx: 0,
            save_dir: PathBuf::from("~/data"),
            overwrite: false,
            verbose: true,
            priority: None,
            serverless: false,
            extra: toml::Table::new(),
        }
    }
}

impl From<toml::Table> for Profile {
    fn from(mut table: toml::Table) -> Self {
        let defaults = Self::default();
        table.remove("serverless");

        Self {
            model: take_or(&mut table, "model", defaults.model),
            fxx: take_or(&mut table, "fxx", defaults.fxx),
            save_dir: take_or(&mut table, "save_dir", defaults.save_dir),
            overwrite: take_or(&mut table, "overwrite", defaults.overwrite),
            verbose: take_or(&mut table, "verbose", defaults.verbose),
            priority: take_or(&mut table, "priority", defaults.priority),
            serverless: defaults.serverless,
            extra: table,
        }
    }
}

/// Removes `key` from `table` and converts it, or returns `default` when the
/// key is absent or holds a value of the wrong type.
fn take_or<T: DeserializeOwned>(table: &mut toml::Table, key: &str, default: T) -> T {
    let Some(value) = table.remove(key) else {
        return default;
    };

    value.try_into().unwrap_or_else(|e: toml::de::Error| {
        tracing::debug!(key, error = %e, "ignoring config value of the wrong type");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_profile() {
        let profile = Profile::default();
        assert_eq!(profile.model, "hrrr");
        assert_eq!(profile.fxx, 0);
        assert_eq!(profile.save_dir, PathBuf::from("~/data"));
        assert!(!profile.overwrite);
        assert!(profile.verbose);
        assert!(profile.priority.is_none());
        assert!(!profile.serverless);
    }

    #[test]
    fn deserialize_empty_document() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn deserialize_partial_profile() {
        let config: Config = toml::from_str(
            r#"
            [default]
            model = "rap"
            overwrite = true
            "#,
        )
        .unwrap();
        assert_eq!(config.default.model, "rap");
        assert!(config.default.overwrite);
        assert_eq!(config.default.fxx, 0);
        assert_eq!(config.default.save_dir, PathBuf::from("~/data"));
    }

    #[test]
    fn deserialize_priority() {
        let config: Config = toml::from_str(
            r#"
            [default]
            priority = ["google", "aws"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.default.priority,
            Some(vec!["google".to_string(), "aws".to_string()])
        );
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let config: Config = toml::from_str(
            r#"
            [default]
            model = "hrrr"
            product = "sfc"

            [work]
            model = "gfs"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.default.extra.get("product").and_then(|v| v.as_str()),
            Some("sfc")
        );
        assert!(config.extra.contains_key("work"));
    }

    #[test]
    fn negative_fxx_falls_back_to_default() {
        let config: Config =
            toml::from_str("[default]\nmodel = \"gfs\"\nfxx = -1\n").unwrap();
        assert_eq!(config.default.fxx, 0);
        assert_eq!(config.default.model, "gfs");
        assert!(!config.default.extra.contains_key("fxx"));
    }

    #[test]
    fn wrong_types_fall_back_per_key() {
        let config: Config = toml::from_str(
            r#"
            [default]
            model = 7
            verbose = "loud"
            overwrite = true
            priority = "aws"
            save_dir = "/scratch/mine"
            "#,
        )
        .unwrap();
        assert_eq!(config.default.model, "hrrr");
        assert!(config.default.verbose);
        assert!(config.default.overwrite);
        assert!(config.default.priority.is_none());
        assert_eq!(config.save_dir(), Path::new("/scratch/mine"));
    }

    #[test]
    fn serverless_in_file_is_ignored() {
        for value in ["true", "\"yes\""] {
            let config: Config =
                toml::from_str(&format!("[default]\nserverless = {value}\n")).unwrap();
            assert!(!config.serverless());
            assert!(!config.default.extra.contains_key("serverless"));
        }
    }

    #[test]
    fn non_table_default_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("default = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn priority_not_serialized_when_none() {
        let toml = toml::to_string(&Config::default()).unwrap();
        assert!(!toml.contains("priority"));
        assert!(toml.contains("[default]"));
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [default]
            model = "nbm"
            fxx = 12
            save_dir = "/scratch/herbie"
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default.model, "nbm");
        assert_eq!(config.default.fxx, 12);
        assert_eq!(config.save_dir(), Path::new("/scratch/herbie"));
        assert!(!config.serverless());
    }
}
