//! # Ledger Configuration
//!
//! Configuration for the storage layer, report calendar and retention sweep.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KOPI_DB_PATH=/var/lib/kopi/kopi.db                                 │
//! │     KOPI_REPORT_UTC_OFFSET_MINUTES=420                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kopi-pos/kopi.toml (Linux)                               │
//! │     ~/Library/Application Support/com.kopi.pos/kopi.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kopi.toml
//! [database]
//! path = "/var/lib/kopi/kopi.db"
//! max_connections = 5
//!
//! [reporting]
//! utc_offset_minutes = 420   # UTC+07:00
//!
//! [retention]
//! enabled = true
//! window_months = 2
//! sweep_interval_secs = 86400
//! ```

use kopi_core::{
    ReportingTimezone, RetentionPolicy, ValidationError, DEFAULT_RETENTION_MONTHS,
    DEFAULT_UTC_OFFSET_MINUTES,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: true,
        }
    }
}

/// `[reporting]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingSettings {
    /// Minutes east of UTC used to bucket report days and months.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        ReportingSettings {
            utc_offset_minutes: default_utc_offset(),
        }
    }
}

/// `[retention]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_window_months")]
    pub window_months: u32,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        RetentionSettings {
            enabled: true,
            window_months: default_window_months(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "kopi", "pos")
        .map(|dirs| dirs.data_dir().join("kopi.db"))
        .unwrap_or_else(|| PathBuf::from("kopi.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_utc_offset() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

fn default_window_months() -> u32 {
    DEFAULT_RETENTION_MONTHS
}

fn default_sweep_interval() -> u64 {
    24 * 60 * 60
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Ledger Config
// =============================================================================

/// Complete configuration for a ledger process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub reporting: ReportingSettings,

    #[serde(default)]
    pub retention: RetentionSettings,
}

impl LedgerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`kopi.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ValidationError::MustBePositive {
                field: "database.max_connections".to_string(),
            }
            .into());
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ValidationError::OutOfRange {
                field: "database.min_connections".to_string(),
                min: 0,
                max: i64::from(self.database.max_connections),
            }
            .into());
        }

        ReportingTimezone::from_offset_minutes(self.reporting.utc_offset_minutes)?;

        if self.retention.enabled {
            RetentionPolicy::new(self.retention.window_months)?;
            if self.retention.sweep_interval_secs == 0 {
                return Err(ValidationError::MustBePositive {
                    field: "retention.sweep_interval_secs".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Applies `KOPI_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparsable values are logged
    /// and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("KOPI_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("KOPI_DB_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid KOPI_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(offset) = lookup("KOPI_REPORT_UTC_OFFSET_MINUTES") {
            match offset.parse() {
                Ok(n) => {
                    debug!(minutes = n, "Overriding reporting offset from environment");
                    self.reporting.utc_offset_minutes = n;
                }
                Err(_) => warn!(value = %offset, "Ignoring invalid KOPI_REPORT_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(enabled) = lookup("KOPI_RETENTION_ENABLED") {
            match enabled.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.retention.enabled = true,
                "0" | "false" | "no" | "off" => self.retention.enabled = false,
                _ => warn!(value = %enabled, "Ignoring invalid KOPI_RETENTION_ENABLED"),
            }
        }

        if let Some(months) = lookup("KOPI_RETENTION_MONTHS") {
            match months.parse() {
                Ok(n) => self.retention.window_months = n,
                Err(_) => warn!(value = %months, "Ignoring invalid KOPI_RETENTION_MONTHS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "kopi", "pos")
            .map(|dirs| dirs.config_dir().join("kopi.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The reporting timezone.
    pub fn reporting_timezone(&self) -> ConfigResult<ReportingTimezone> {
        Ok(ReportingTimezone::from_offset_minutes(
            self.reporting.utc_offset_minutes,
        )?)
    }

    /// Pool settings for [`crate::Database::new`].
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        let db = &self.database;
        Ok(DbConfig::new(db.path.clone())
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .connect_timeout(Duration::from_secs(db.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(db.idle_timeout_secs))
            .run_migrations(db.run_migrations)
            .reporting_timezone(self.reporting_timezone()?))
    }

    /// The retention policy, or `None` when the sweep is disabled.
    pub fn retention_policy(&self) -> ConfigResult<Option<RetentionPolicy>> {
        if !self.retention.enabled {
            return Ok(None);
        }
        Ok(Some(RetentionPolicy::new(self.retention.window_months)?))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention.sweep_interval_secs)
    }
}
