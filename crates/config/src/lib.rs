//! Runtime configuration for Herbie.
//!
//! This crate decides, once per process, where Herbie may write files and
//! which defaults it runs with. It never fails because of the host: on a
//! read-only or ephemeral system it quietly falls back to built-in defaults.
//!
//! # Overview
//!
//! - [`env`]: access to environment variables and well-known directories
//! - [`expand`]: `$VAR` and `~` expansion for configured paths
//! - [`mode`]: serverless environment detection
//! - [`config`]: the [`Config`] and [`Profile`] types
//! - [`persistence`]: config directory layout, file reading and creation
//! - [`template`]: embedded default file contents
//! - [`resolver`]: the startup fallback chain
//! - [`error`]: error types
//!
//! # Environment Variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `HERBIE_CONFIG_PATH` | Configuration directory (default `~/.config/herbie`) |
//! | `HERBIE_SAVE_DIR` | Replaces `save_dir` from the file |
//! | `HERBIE_SERVERLESS` | `true`/`false` forces the mode, unset auto-detects |
//! | `HERBIE_VERBOSE` | `false` silences startup messages |
//!
//! # Examples
//!
//! ```no_run
//! use herbie_config::Resolver;
//!
//! # fn example() -> herbie_config::Result<()> {
//! let config = Resolver::from_process_env().resolve()?;
//! println!("saving to {}", config.save_dir().display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod expand;
pub mod mode;
pub mod persistence;
pub mod resolver;
pub mod template;

// Re-export primary types at crate root for convenience
pub use config::{Config, Profile};
pub use error::{ConfigError, Result};
pub use expand::{ExpandOptions, expand_path};
pub use mode::{EnvironmentMode, classify};
pub use persistence::ConfigPaths;
pub use resolver::{ConfigSource, DegradeReason, Resolution, Resolver};
