use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default config file name, looked up in the current directory when no
/// `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "refund-estimator.toml";

/// Settings read from the TOML config file.
///
/// Command-line flags override these values; both fields default so a
/// partial (or absent) file is fine:
///
/// ```toml
/// backend = "sqlite"
/// database = "refunds.db"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Database backend name (must match a registered factory).
    pub backend: String,
    /// Connection string passed through to the backend.
    pub database: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            database: "refunds.db".to_string(),
        }
    }
}

impl CliConfig {
    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("cannot parse config file '{}'", path.display()))
    }

    /// Resolve the effective config.
    ///
    /// An explicit `path` must exist and parse. With no path, the default
    /// file is used if present, otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
