//! Import configuration file support
//!
//! Handles parsing of `.warehouse-import.toml` configuration files and
//! environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dialect::DialectKind;
use crate::error::{ImportError, ImportResult};
use crate::options::ImportOptions;
use crate::transaction::{
    DEFAULT_INITIAL_INTERVAL_MS, DEFAULT_MAX_INTERVAL_MS, DEFAULT_MULTIPLIER,
    DEFAULT_ROLLBACK_ATTEMPTS, RetryPolicy,
};

/// Default database filename for the embedded backend
pub const DEFAULT_DUCKDB_FILENAME: &str = ".warehouse-import.duckdb";

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".warehouse-import.toml";

/// Environment variable for the dialect
pub const ENV_DIALECT: &str = "WAREHOUSE_IMPORT_DIALECT";

/// Environment variable for the DuckDB path
pub const ENV_DUCKDB_PATH: &str = "WAREHOUSE_IMPORT_DUCKDB_PATH";

/// Environment variable for the rollback attempt budget
pub const ENV_ROLLBACK_MAX_ATTEMPTS: &str = "WAREHOUSE_IMPORT_ROLLBACK_MAX_ATTEMPTS";

/// Backend configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    /// SQL dialect of the destination warehouse
    #[serde(default)]
    pub dialect: DialectKind,

    /// Path to the DuckDB database file (relative to the config directory)
    #[serde(default = "default_duckdb_path")]
    pub duckdb_path: String,
}

fn default_duckdb_path() -> String {
    DEFAULT_DUCKDB_FILENAME.to_string()
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            duckdb_path: default_duckdb_path(),
        }
    }
}

/// Rollback retry section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_ROLLBACK_ATTEMPTS
}

fn default_initial_interval_ms() -> u64 {
    DEFAULT_INITIAL_INTERVAL_MS
}

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

fn default_max_interval_ms() -> u64 {
    DEFAULT_MAX_INTERVAL_MS
}

impl Default for RollbackSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_interval_ms: default_initial_interval_ms(),
            multiplier: default_multiplier(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

impl From<&RollbackSection> for RetryPolicy {
    fn from(section: &RollbackSection) -> Self {
        Self {
            max_attempts: section.max_attempts,
            initial_interval: Duration::from_millis(section.initial_interval_ms),
            multiplier: section.multiplier,
            max_interval: Duration::from_millis(section.max_interval_ms),
        }
    }
}

/// Defaults for new import options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSection {
    #[serde(default)]
    pub use_timestamp: bool,

    #[serde(default = "default_null_manipulation")]
    pub null_manipulation: bool,
}

fn default_null_manipulation() -> bool {
    true
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            use_timestamp: false,
            null_manipulation: default_null_manipulation(),
        }
    }
}

/// Main configuration structure
///
/// Represents the `.warehouse-import.toml` configuration file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ImportConfig {
    #[serde(default)]
    pub backend: BackendSection,

    #[serde(default)]
    pub rollback: RollbackSection,

    #[serde(default)]
    pub import: ImportSection,
}

impl ImportConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration for one dialect
    pub fn for_dialect(dialect: DialectKind) -> Self {
        Self {
            backend: BackendSection {
                dialect,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load configuration from a directory
    ///
    /// Looks for `.warehouse-import.toml` in the directory.
    /// Falls back to defaults if not found.
    pub fn load(dir: &Path) -> ImportResult<Self> {
        let config_path = dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ImportError::Config(format!("Failed to read config: {}", e)))?;

            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        tracing::debug!(
            dialect = %config.backend.dialect,
            path = %config_path.display(),
            "Loaded import configuration"
        );

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ImportResult<Self> {
        toml::from_str(content)
            .map_err(|e| ImportError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a directory
    pub fn save(&self, dir: &Path) -> ImportResult<()> {
        let config_path = dir.join(CONFIG_FILENAME);
        let content = self.to_toml()?;

        std::fs::write(&config_path, content)
            .map_err(|e| ImportError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ImportResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ImportError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dialect) = std::env::var(ENV_DIALECT) {
            match dialect.parse() {
                Ok(kind) => self.backend.dialect = kind,
                Err(e) => tracing::warn!(error = %e, "Ignoring {}", ENV_DIALECT),
            }
        }

        if let Ok(path) = std::env::var(ENV_DUCKDB_PATH) {
            self.backend.duckdb_path = path;
        }

        if let Ok(attempts) = std::env::var(ENV_ROLLBACK_MAX_ATTEMPTS)
            && let Ok(attempts) = attempts.parse()
        {
            self.rollback.max_attempts = attempts;
        }
    }

    /// Get the DuckDB database path relative to `dir`
    pub fn get_duckdb_path(&self, dir: &Path) -> PathBuf {
        if self.backend.duckdb_path.is_empty() {
            dir.join(DEFAULT_DUCKDB_FILENAME)
        } else if Path::new(&self.backend.duckdb_path).is_absolute() {
            PathBuf::from(&self.backend.duckdb_path)
        } else {
            dir.join(&self.backend.duckdb_path)
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.rollback)
    }

    /// Fresh import options carrying the configured defaults
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::default()
            .use_timestamp(self.import.use_timestamp)
            .null_manipulation(self.import.null_manipulation)
    }

    /// Check if configuration exists in a directory
    pub fn exists(dir: &Path) -> bool {
        dir.join(CONFIG_FILENAME).exists()
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Warehouse import configuration

[backend]
# SQL dialect: "snowflake", "synapse", "exasol", "teradata", "bigquery" or "duckdb" (default)
dialect = "duckdb"

# Path to DuckDB database file (relative to this directory, or absolute)
duckdb_path = ".warehouse-import.duckdb"

[rollback]
# ROLLBACK attempts after a failed transaction
max_attempts = 10
initial_interval_ms = 500
multiplier = 1.5
max_interval_ms = 30000

[import]
# Write the load time into the _timestamp column
use_timestamp = false

# Apply empty-string/NULL normalisation when copying values
null_manipulation = true
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ImportConfig::new();
        assert_eq!(config.backend.dialect, DialectKind::DuckDB);
        assert_eq!(config.backend.duckdb_path, DEFAULT_DUCKDB_FILENAME);
        assert_eq!(config.rollback.max_attempts, 10);
        assert!(config.import.null_manipulation);
        assert!(!config.import.use_timestamp);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[backend]
dialect = "snowflake"

[rollback]
max_attempts = 3
initial_interval_ms = 100

[import]
use_timestamp = true
null_manipulation = false
"#;
        let config = ImportConfig::parse(toml).unwrap();
        assert_eq!(config.backend.dialect, DialectKind::Snowflake);
        assert_eq!(config.backend.duckdb_path, DEFAULT_DUCKDB_FILENAME);
        assert_eq!(config.rollback.max_attempts, 3);
        assert_eq!(config.rollback.multiplier, 1.5);

        let policy = config.retry_policy();
        assert_eq!(policy.initial_interval, Duration::from_millis(100));
        assert_eq!(policy.max_interval, Duration::from_millis(30_000));

        let options = config.import_options();
        assert!(options.uses_timestamp());
        assert!(!options.is_null_manipulation_enabled());
    }

    #[test]
    fn test_parse_unknown_dialect() {
        let err = ImportConfig::parse("[backend]\ndialect = \"oracle\"\n").unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let config = ImportConfig::for_dialect(DialectKind::Teradata);

        config.save(dir.path()).unwrap();
        assert!(ImportConfig::exists(dir.path()));

        let loaded = ImportConfig::parse(
            &std::fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = ImportConfig::load(dir.path()).unwrap();
        assert_eq!(config.rollback, RollbackSection::default());
    }

    #[test]
    fn test_get_duckdb_path() {
        let mut config = ImportConfig::new();
        config.backend.duckdb_path = "relative.duckdb".to_string();
        assert_eq!(
            config.get_duckdb_path(Path::new("/workspace")),
            PathBuf::from("/workspace/relative.duckdb")
        );
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = ImportConfig::parse(sample_config()).unwrap();
        assert_eq!(config, ImportConfig::default());
    }
}
