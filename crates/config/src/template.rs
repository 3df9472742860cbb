//! Embedded file contents.
//!
//! [`DEFAULT_CONFIG`] doubles as the in-memory fallback, so it must always
//! parse; the unit tests below guard that.

use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Contents written to a freshly created `config.toml`.
pub const DEFAULT_CONFIG: &str = r#"# Herbie defaults

[default]
model = "hrrr"
fxx = 0
save_dir = "~/data"
overwrite = false
verbose = true

# -----------------------------------------------------------------------------
# Source priority
#
# Data sources are tried in the order listed by each model template unless a
# priority list is set here. A default priority can hide sources that are not
# listed, so leave it unset unless you need it.
#
#priority = ["aws", "nomads", "google", "azure"]

# -----------------------------------------------------------------------------
# Serverless mode
#
# Read-only and ephemeral hosts are detected automatically. Export
# HERBIE_SERVERLESS=true or HERBIE_SERVERLESS=false to force the mode; any
# value written here is replaced at startup.
#
#serverless = false
"#;

/// Contents of the placeholder model template next to the config file.
pub const CUSTOM_TEMPLATE: &str = r#"
# =============================================================================
# Local model templates
# =============================================================================
#
# Describe GRIB2 files you keep on local or network storage so Herbie can find
# them like any other source. Uncomment the example, rename it, and point the
# SOURCES entries at your own directory layout.
#
# '''
# class my_local_model:
#     def template(self):
#         self.DESCRIPTION = "Locally stored GRIB2 output"
#         self.DETAILS = {
#             "local_main": "Primary archive of experiment output",
#         }
#         self.PRODUCTS = {
#             "sfc": "Surface fields",
#             "prs": "Pressure level fields",
#         }
#         self.SOURCES = {
#             "local_main": f"/archive/{self.model}/{self.date:%Y%m%d%H}/out.t{self.date:%H}z.{self.product}.f{self.fxx:02d}.grib2",
#         }
#         self.LOCALFILE = f"{self.get_remoteFileName}"
# '''
"#;

/// Parses [`DEFAULT_CONFIG`].
///
/// # Errors
///
/// Returns [`ConfigError::TemplateCorruption`] if the embedded template is
/// malformed.
///
/// # Examples
///
/// ```
/// let config = herbie_config::template::default_config().unwrap();
/// assert_eq!(config.default.model, "hrrr");
/// assert_eq!(config.default.fxx, 0);
/// ```
pub fn default_config() -> Result<Config> {
    toml::from_str(DEFAULT_CONFIG).map_err(ConfigError::TemplateCorruption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_parses() {
        let config = default_config().unwrap();
        let profile = &config.default;
        assert_eq!(profile.model, "hrrr");
        assert_eq!(profile.fxx, 0);
        assert_eq!(profile.save_dir, PathBuf::from("~/data"));
        assert!(!profile.overwrite);
        assert!(profile.verbose);
        assert_eq!(profile.priority, None);
        assert!(!profile.serverless);
        assert!(profile.extra.is_empty());
        assert!(config.extra.is_empty());
    }

    #[test]
    fn default_config_matches_profile_defaults() {
        assert_eq!(default_config().unwrap(), Config::default());
    }

    #[test]
    fn custom_template_is_all_comments() {
        assert!(
            CUSTOM_TEMPLATE
                .lines()
                .all(|line| line.trim().is_empty() || line.trim_start().starts_with('#'))
        );
    }
}
