//! Configuration file for the `tax-engine` binary.
//!
//! Every section is optional:
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "rates.db"
//! seed = false
//!
//! [logging]
//! level = "debug"
//! file = "tax-engine.log"
//!
//! [engine.brackets]
//! default_schedule = "PAYE"
//!
//! [[engine.levies]]
//! name = "AIDS Levy"
//! rate = "0.03"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tax_core::config::EngineConfig;
use tax_core::db::DbConfig;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter directive; `RUST_LOG` applies when unset.
    pub level: Option<String>,
    /// File the log is appended to, besides stderr.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub database: DbConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("invalid configuration")?;
        config
            .engine
            .validate()
            .context("invalid engine configuration")?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to load config: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// [`CliConfig::load`] when a path is given, the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::Levy;

    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = CliConfig::from_toml_str("").unwrap();

        assert_eq!(config, CliConfig::default());
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.engine.levies, vec![Levy::aids_levy()]);
    }

    #[test]
    fn sections_override_defaults() {
        let config = CliConfig::from_toml_str(
            r#"
            [database]
            connection_string = "rates.db"
            seed = false

            [logging]
            level = "debug"

            [engine.rates]
            default_rate = "0.05"

            [engine.brackets]
            contiguity_tolerance = "0"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.connection_string, "rates.db");
        assert!(!config.database.seed);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.file, None);
        assert_eq!(config.engine.rates.default_rate, dec!(0.05));
        assert_eq!(config.engine.brackets.contiguity_tolerance, dec!(0));
        assert_eq!(config.engine.brackets.default_schedule, "PAYE");
    }

    #[test]
    fn levies_can_be_replaced() {
        let config = CliConfig::from_toml_str(
            r#"
            [[engine.levies]]
            name = "Health Levy"
            rate = "0.01"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.levies, vec![Levy::new("Health Levy", dec!(0.01))]);
    }

    #[test]
    fn invalid_engine_settings_are_rejected() {
        let err = CliConfig::from_toml_str(
            r#"
            [engine.brackets]
            contiguity_tolerance = "-1"
            "#,
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "invalid engine configuration");
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(CliConfig::from_toml_str("[database").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = CliConfig::load(Path::new("/nonexistent/tax-engine.toml")).unwrap_err();

        assert!(err.to_string().contains("/nonexistent/tax-engine.toml"));
    }
}
