//! Herbie - retrieve numerical weather prediction model output.
//!
//! This crate owns the process-wide configuration. Call [`init`] once near
//! the start of the program; every later call, and [`config`], hands out the
//! same immutable [`Config`].
//!
//! ```no_run
//! fn main() -> herbie::Result<()> {
//!     let config = herbie::init()?;
//!     println!(
//!         "{} f{:02} -> {}",
//!         config.default.model,
//!         config.default.fxx,
//!         config.save_dir().display()
//!     );
//!     Ok(())
//! }
//! ```

use std::sync::OnceLock;

pub use herbie_config::{
    Config, ConfigError, ConfigPaths, ConfigSource, EnvironmentMode, ExpandOptions, Profile,
    Resolution, Resolver, Result, classify, expand_path,
};

/// Lower-level configuration APIs.
pub use herbie_config as configuration;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Resolves the process configuration on first call and returns it.
///
/// Later calls return the stored value without looking at the environment
/// or file system again.
///
/// # Errors
///
/// Only if the embedded default configuration is malformed. Environment and
/// file system problems fall back to defaults instead.
pub fn init() -> Result<&'static Config> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let resolver = Resolver::from_process_env();
    tracing::debug!(mode = %resolver.mode(), dir = %resolver.paths().dir.display(), "resolving configuration");
    let config = resolver.resolve()?;
    Ok(CONFIG.get_or_init(|| config))
}

/// Returns the configuration if [`init`] has run.
#[must_use]
pub fn config() -> Option<&'static Config> {
    CONFIG.get()
}
