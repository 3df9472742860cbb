//! Config file reading and writing.
//!
//! # File Layout
//!
//! The configuration directory (`~/.config/herbie` unless
//! [`CONFIG_PATH_VAR`] says otherwise) holds:
//!
//! - `config.toml`: the configuration itself
//! - `__init__.py`: empty marker that makes the directory importable by the
//!   model template engine
//! - `custom_template.py`: commented-out example of a local model template
//!
//! Files are only ever created when absent. Nothing here overwrites a file
//! that already exists.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::env::{CONFIG_PATH_VAR, Environment};
use crate::error::{ConfigError, Result};
use crate::expand::{expand_user, expand_vars};
use crate::template::{CUSTOM_TEMPLATE, DEFAULT_CONFIG};

/// Configuration directory used when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_DIR: &str = "~/.config/herbie";

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Name of the empty extension-point marker file.
pub const INIT_FILE_NAME: &str = "__init__.py";

/// Name of the placeholder model template file.
pub const CUSTOM_TEMPLATE_FILE_NAME: &str = "custom_template.py";

/// Locations of every file in the configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// The configuration directory.
    pub dir: PathBuf,
    /// `config.toml`.
    pub file: PathBuf,
    /// `__init__.py`.
    pub init_file: PathBuf,
    /// `custom_template.py`.
    pub custom_template_file: PathBuf,
}

impl ConfigPaths {
    /// Lays out the files inside `dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use herbie_config::ConfigPaths;
    ///
    /// let paths = ConfigPaths::in_dir("/etc/herbie");
    /// assert_eq!(paths.file, Path::new("/etc/herbie/config.toml"));
    /// ```
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            file: dir.join(CONFIG_FILE_NAME),
            init_file: dir.join(INIT_FILE_NAME),
            custom_template_file: dir.join(CUSTOM_TEMPLATE_FILE_NAME),
            dir,
        }
    }

    /// Locates the configuration directory for an environment.
    ///
    /// Uses [`CONFIG_PATH_VAR`] if set, [`DEFAULT_CONFIG_DIR`] otherwise,
    /// with variables and `~` expanded.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use herbie_config::ConfigPaths;
    /// use herbie_config::env::MapEnv;
    ///
    /// let env = MapEnv::new().with_home("/home/racer");
    /// let paths = ConfigPaths::from_env(&env);
    /// assert_eq!(paths.dir, Path::new("/home/racer/.config/herbie"));
    ///
    /// let env = env.with_var("HERBIE_CONFIG_PATH", "~/herbie-conf");
    /// let paths = ConfigPaths::from_env(&env);
    /// assert_eq!(paths.dir, Path::new("/home/racer/herbie-conf"));
    /// ```
    #[must_use]
    pub fn from_env(env: &impl Environment) -> Self {
        let raw = env
            .var_non_empty(CONFIG_PATH_VAR)
            .unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());
        Self::in_dir(expand_user(&expand_vars(&raw, env), env))
    }
}

/// Reads and parses a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFile`] if the file cannot be read (check
/// [`ConfigError::is_not_found`] for a missing file) and
/// [`ConfigError::Parse`] if it is not a valid configuration.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes `contents` to `path` unless the file already exists.
///
/// Returns `true` if the file was created here. A failed write removes the
/// half-written file.
///
/// # Errors
///
/// Returns [`ConfigError::WriteFile`] on any I/O error other than the file
/// already existing.
pub fn create_file_if_absent(path: impl AsRef<Path>, contents: &str) -> Result<bool> {
    let path = path.as_ref();
    let write_error = |source: std::io::Error| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(write_error(e)),
    };

    if let Err(e) = file.write_all(contents.as_bytes()).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = std::fs::remove_file(path);
        return Err(write_error(e));
    }

    Ok(true)
}

/// Creates the configuration directory and any missing files in it.
///
/// `config.toml` is written last, so a failure leaves no new config file
/// behind for the next run to pick up.
///
/// Returns `true` if `config.toml` itself was created here, `false` if it
/// already existed.
///
/// # Errors
///
/// Returns an error if the directory or any file cannot be created.
pub fn write_default_files(paths: &ConfigPaths) -> Result<bool> {
    std::fs::create_dir_all(&paths.dir).map_err(|e| ConfigError::CreateDir {
        path: paths.dir.clone(),
        source: e,
    })?;

    create_file_if_absent(&paths.init_file, "")?;
    create_file_if_absent(&paths.custom_template_file, CUSTOM_TEMPLATE)?;
    create_file_if_absent(&paths.file, DEFAULT_CONFIG)
}
