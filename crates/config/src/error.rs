//! Error types for configuration operations.
//!
//! Almost every variant here is absorbed by the resolver and turned into a
//! fallback. Only [`ConfigError::TemplateCorruption`] escapes
//! [`Resolver::resolve`](crate::Resolver::resolve).

use std::path::PathBuf;

/// Errors that can occur while expanding paths or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a configuration file.
    #[error("failed to write config file at {path}: {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the configuration directory.
    #[error("failed to create config directory at {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file exists but is not valid TOML for a [`Config`](crate::Config).
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Canonicalizing a path failed.
    #[error("failed to resolve path {path}: {source}")]
    Canonicalize {
        /// The path that could not be canonicalized.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The current working directory is unavailable.
    #[error("could not determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// The embedded default template does not parse.
    ///
    /// This is a build defect, not a runtime condition.
    #[error("embedded default config template is malformed: {0}")]
    TemplateCorruption(#[source] toml::de::Error),
}

impl ConfigError {
    /// Returns `true` if this error means the file simply does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    /// use std::path::PathBuf;
    /// use herbie_config::ConfigError;
    ///
    /// let err = ConfigError::ReadFile {
    ///     path: PathBuf::from("config.toml"),
    ///     source: io::Error::from(io::ErrorKind::NotFound),
    /// };
    /// assert!(err.is_not_found());
    ///
    /// let err = ConfigError::CurrentDir(io::Error::from(io::ErrorKind::NotFound));
    /// assert!(!err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ReadFile { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
