// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Configuration for the ingestion pipeline.
//!
//! Defaults match the command-line defaults; an optional YAML file can
//! override them, and explicit command-line flags override the file.

use crate::client::HttpConnector;
use crate::pipeline::DEFAULT_CHUNK_SIZE;
use crate::writer::{RetryPolicy, DEFAULT_RETENTION_POLICY};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Logging threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "ERROR")]
    Error,
    #[serde(alias = "WARN")]
    Warn,
    #[default]
    #[serde(alias = "INFO")]
    Info,
    #[serde(alias = "DEBUG")]
    Debug,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    /// Accepts a level name in any case, or the numeric form
    /// (ERROR=0, WARN=1, INFO=2, DEBUG=3).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "0" => Ok(LogLevel::Error),
            "warn" | "warning" | "1" => Ok(LogLevel::Warn),
            "info" | "2" => Ok(LogLevel::Info),
            "debug" | "3" => Ok(LogLevel::Debug),
            other => Err(ConfigError::Invalid(format!(
                "unknown log level '{}' (expected ERROR, WARN, INFO, DEBUG or 0-3)",
                other
            ))),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Records per write.
    pub chunk_size: usize,
    /// Logging threshold.
    pub log_level: LogLevel,
    /// Store connection settings.
    pub influxdb: InfluxDbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            log_level: LogLevel::default(),
            influxdb: InfluxDbConfig::default(),
        }
    }
}

/// InfluxDB connection configuration.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InfluxDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Target database. Required.
    pub database: String,
    pub retention_policy: String,
    /// Request timeout for pings and writes (milliseconds).
    pub timeout_ms: u64,
    /// Extra attempts for a failed write. 0 = log and drop.
    pub write_retries: u32,
    /// Pause between write attempts (milliseconds).
    pub retry_backoff_ms: u64,
}

impl Default for InfluxDbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            retention_policy: DEFAULT_RETENTION_POLICY.to_string(),
            timeout_ms: 5000,
            write_retries: 0,
            retry_backoff_ms: 1000,
        }
    }
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for InfluxDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("InfluxDbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &password)
            .field("database", &self.database)
            .field("retention_policy", &self.retention_policy)
            .field("timeout_ms", &self.timeout_ms)
            .field("write_retries", &self.write_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl InfluxDbConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Write retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.write_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// HTTP connector for these settings.
    pub fn connector(&self) -> HttpConnector {
        HttpConnector::new(&self.host, self.port, self.timeout())
            .with_credentials(&self.username, &self.password)
    }
}

impl Config {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Check values that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk size must be at least 1".into()));
        }
        if self.influxdb.database.trim().is_empty() {
            return Err(ConfigError::Invalid("database name is required".into()));
        }
        if self.influxdb.host.trim().is_empty() {
            return Err(ConfigError::Invalid("store host must not be empty".into()));
        }
        if self.influxdb.port == 0 {
            return Err(ConfigError::Invalid("store port must not be 0".into()));
        }
        if self.influxdb.retention_policy.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "retention policy must not be empty".into(),
            ));
        }
        Ok(())
    }
}
