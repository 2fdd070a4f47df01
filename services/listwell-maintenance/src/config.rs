//! Maintenance Configuration
//!
//! Configuration for the listwell-maintenance job.
//! Supports environment variables, config files, and CLI arguments.

use std::time::Duration;

use listwell_engine::EngineConfig;
use listwell_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Maintenance job configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Listing store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Lifecycle controller settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Cycle scheduling for `watch`
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between cycles in `watch` mode
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seed for every random draw; unset means entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            seed: None,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_interval_secs() -> u64 {
    900 // 15 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl MaintenanceConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // Environment variables with LISTWELL__ prefix, e.g. LISTWELL__ENGINE__TOPUP__MIN_OPEN
        builder = builder.add_source(
            config::Environment::with_prefix("LISTWELL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: MaintenanceConfig = builder.build()?.try_deserialize()?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Create a configuration for local development
    pub fn development() -> Self {
        Self {
            store: StoreConfig {
                database_url: "sqlite://listwell-dev.db".to_string(),
                ..Default::default()
            },
            engine: EngineConfig::default(),
            schedule: ScheduleConfig {
                interval_secs: 60,
                seed: Some(42),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MaintenanceConfig::default();
        assert_eq!(config.schedule.interval(), Duration::from_secs(900));
        assert_eq!(config.schedule.seed, None);
        assert_eq!(config.engine.topup.min_open, 50);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_development_config() {
        let config = MaintenanceConfig::development();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.schedule.seed, Some(42));
        config.engine.validate().unwrap();
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let schedule = ScheduleConfig {
            interval_secs: 0,
            seed: None,
        };
        assert_eq!(schedule.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: MaintenanceConfig = serde_json::from_str(
            r#"{"engine": {"topup": {"min_open": 12}}, "schedule": {"seed": 7}}"#,
        )
        .unwrap();
        assert_eq!(config.engine.topup.min_open, 12);
        assert_eq!(config.engine.activity.sample_size, 15);
        assert_eq!(config.schedule.seed, Some(7));
        assert_eq!(config.schedule.interval_secs, 900);
    }
}
