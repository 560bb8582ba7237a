use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use regex::RegexBuilder;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid timezone: {0}. Must be an IANA name such as America/Los_Angeles")]
    InvalidTimezone(String),

    #[error("Invalid {name}: {value}. Must be between 0.0 and 1.0")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid poll_interval_secs: {0}. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("Invalid classification_timeout_secs: {0}. Must be at least 1")]
    InvalidClassificationTimeout(u64),

    #[error("Invalid batch_size: {0}. Must be at least 1")]
    InvalidBatchSize(u32),

    #[error("Invalid handler '{name}': {reason}")]
    InvalidHandler { name: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .lifelog/config.yaml (project config)
    /// 3. .lifelog/local.yaml (local overrides, optional)
    /// 4. Environment variables (LIFELOG_* prefix, `__` separates nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".lifelog/config.yaml"))
            .merge(Yaml::file(".lifelog/local.yaml"))
            .merge(Env::prefixed("LIFELOG_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file; environment variables still
    /// override it.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("LIFELOG_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.timezone.parse::<Tz>().is_err() {
            return Err(ConfigError::InvalidTimezone(config.timezone.clone()));
        }

        check_unit_interval("dispatch_threshold", config.routing.dispatch_threshold)?;
        check_unit_interval("fallback_confidence", config.routing.fallback_confidence)?;

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        if config.rate_limit.requests_per_second.is_nan()
            || config.rate_limit.requests_per_second <= 0.0
        {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.reasoning.classification_timeout_secs == 0 {
            return Err(ConfigError::InvalidClassificationTimeout(
                config.reasoning.classification_timeout_secs,
            ));
        }

        if config.ingestion.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(
                config.ingestion.poll_interval_secs,
            ));
        }

        if config.ingestion.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(config.ingestion.batch_size));
        }

        if config.ingestion.lookback_minutes <= 0 {
            return Err(ConfigError::ValidationFailed(format!(
                "ingestion.lookback_minutes must be positive, got {}",
                config.ingestion.lookback_minutes
            )));
        }

        if config.notifications.channel_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "notifications.channel_capacity must be at least 1".to_string(),
            ));
        }

        Self::validate_handlers(config)
    }

    fn validate_handlers(config: &Config) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for handler in &config.handlers {
            let invalid = |reason: String| ConfigError::InvalidHandler {
                name: handler.name.clone(),
                reason,
            };

            if handler.name.is_empty() {
                return Err(invalid("name cannot be empty".to_string()));
            }
            if !handler
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(invalid("name may only contain a-z, 0-9 and '_'".to_string()));
            }
            if !seen.insert(handler.name.as_str()) {
                return Err(invalid("duplicate handler name".to_string()));
            }

            for pattern in &handler.question_patterns {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| invalid(format!("invalid question pattern '{pattern}': {e}")))?;
            }

            for task in &handler.scheduled_tasks {
                NaiveTime::parse_from_str(&task.at, "%H:%M").map_err(|_| {
                    invalid(format!(
                        "scheduled task '{}' has invalid time '{}', expected HH:MM",
                        task.name, task.at
                    ))
                })?;
            }
        }

        Ok(())
    }
}

fn check_unit_interval(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}
