//! Service configuration
//!
//! Provides [`StrataConfig`], loaded from TOML with every field optional.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Migration service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Migrate stale documents when they are loaded
    pub migrate_on_load: bool,
    /// Refuse documents written by a newer registry instead of passing them through
    pub reject_future_versions: bool,
    /// Tracing setup
    pub logging: LoggingConfig,
}

impl StrataConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With migrate-on-load toggled
    #[inline]
    #[must_use]
    pub fn with_migrate_on_load(mut self, enabled: bool) -> Self {
        self.migrate_on_load = enabled;
        self
    }

    /// With future-version rejection toggled
    #[inline]
    #[must_use]
    pub fn with_reject_future_versions(mut self, enabled: bool) -> Self {
        self.reject_future_versions = enabled;
        self
    }

    /// With logging settings
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the TOML is invalid
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            migrate_on_load: true,
            reject_future_versions: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML could not be parsed
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = StrataConfig::new();
        assert!(config.migrate_on_load);
        assert!(!config.reject_future_versions);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(StrataConfig::from_toml_str("").unwrap(), StrataConfig::default());
    }

    #[test]
    fn partial_toml() {
        let config = StrataConfig::from_toml_str(
            r#"
            reject_future_versions = true

            [logging]
            json = true
            "#,
        )
        .unwrap();
        assert!(config.reject_future_versions);
        assert!(config.migrate_on_load);
        assert!(config.logging.json);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn invalid_toml() {
        let result = StrataConfig::from_toml_str("migrate_on_load = \"yes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "migrate_on_load = false").unwrap();
        let config = StrataConfig::from_toml_file(file.path()).unwrap();
        assert!(!config.migrate_on_load);
    }

    #[test]
    fn missing_file() {
        let result = StrataConfig::from_toml_file("/nonexistent/strata.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn builders() {
        let config = StrataConfig::new()
            .with_migrate_on_load(false)
            .with_reject_future_versions(true)
            .with_logging(LoggingConfig {
                filter: "debug".into(),
                json: true,
            });
        assert!(!config.migrate_on_load);
        assert!(config.reject_future_versions);
        assert_eq!(config.logging.filter, "debug");
    }
}
