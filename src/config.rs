//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub backup: BackupConfig,
    pub logging: LoggingConfig,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Backup configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Enable scheduled backups
    pub enabled: bool,
    /// Directory for backup files
    pub directory: PathBuf,
    /// Backup interval in seconds (default: 86400 = 24h)
    pub interval_seconds: u64,
    /// Number of backup files to keep
    pub retention_count: usize,
    /// Application name used in backup file names
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_file_prefix() -> String {
    crate::storage::DEFAULT_FILE_PREFIX.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (KINETIC_QUOTES__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("database.path", "data/kinetic-quotes.db")?
            .set_default("backup.enabled", false)?
            .set_default("backup.directory", "backups")?
            .set_default("backup.interval_seconds", 86400)?
            .set_default("backup.retention_count", 7)?
            .set_default("backup.file_prefix", crate::storage::DEFAULT_FILE_PREFIX)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (KINETIC_QUOTES__*)
            .add_source(
                Environment::with_prefix("KINETIC_QUOTES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Default filter directive for the log subscriber
    pub fn log_filter(&self) -> String {
        format!("kinetic_quotes={},sqlx=warn", self.logging.level)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        let prefix = self.backup.file_prefix.trim();
        if prefix.is_empty() {
            return Err(crate::error::AppError::Config(
                "backup.file_prefix must not be empty".to_string(),
            ));
        }

        if prefix.contains(['/', '\\']) {
            return Err(crate::error::AppError::Config(
                "backup.file_prefix must not contain path separators".to_string(),
            ));
        }

        if self.backup.retention_count == 0 {
            return Err(crate::error::AppError::Config(
                "backup.retention_count must be greater than 0".to_string(),
            ));
        }

        if self.backup.enabled && self.backup.interval_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "backup.interval_seconds must be greater than 0 when backups are enabled"
                    .to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            tracing::warn!(
                format = %self.logging.format,
                "Unknown logging.format; falling back to pretty"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/kinetic-quotes-test.db"),
            },
            backup: BackupConfig {
                enabled: true,
                directory: PathBuf::from("/tmp/kinetic-quotes-backups"),
                interval_seconds: 86_400,
                retention_count: 7,
                file_prefix: "kinetic-quotes".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_prefix_with_separator() {
        let mut config = valid_config();
        config.backup.file_prefix = "../escape".to_string();

        let error = config
            .validate()
            .expect_err("path separators in the prefix must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("backup.file_prefix")
        ));
    }

    #[test]
    fn validate_rejects_zero_interval_when_enabled() {
        let mut config = valid_config();
        config.backup.interval_seconds = 0;
        assert!(config.validate().is_err());

        config.backup.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_retention() {
        let mut config = valid_config();
        config.backup.retention_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_filter_scopes_level_to_crate() {
        let mut config = valid_config();
        config.logging.level = "debug".to_string();
        assert_eq!(config.log_filter(), "kinetic_quotes=debug,sqlx=warn");
    }
}
