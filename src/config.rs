//! Configuration module for GradeTrack.

use serde::Deserialize;
use std::path::Path;

use crate::{GradetrackError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/gradetrack.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/gradetrack.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Security policy configuration.
///
/// Covers the rate-limit window, token lifetimes, and password hashing
/// parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Maximum requests per key within the rate-limit window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Rate-limit window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Interval between rate-limit sweeps in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Lifetime of email verification and email-change tokens in seconds.
    #[serde(default = "default_email_token_ttl_secs")]
    pub email_token_ttl_secs: u64,
    /// Lifetime of password-reset tokens in seconds.
    #[serde(default = "default_reset_token_ttl_secs")]
    pub reset_token_ttl_secs: u64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    /// Argon2 time cost (iterations).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 parallelism (threads).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_sweep_interval_secs() -> u64 {
    30 * 60
}

fn default_email_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_reset_token_ttl_secs() -> u64 {
    60 * 60
}

fn default_argon2_memory_kib() -> u32 {
    65536
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            email_token_ttl_secs: default_email_token_ttl_secs(),
            reset_token_ttl_secs: default_reset_token_ttl_secs(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

/// SMTP configuration for outgoing mail.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay hostname.
    #[serde(default)]
    pub host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Username for SMTP authentication.
    #[serde(default)]
    pub username: String,
    /// Password for SMTP authentication.
    #[serde(default)]
    pub password: String,
    /// From address for outgoing mail.
    #[serde(default = "default_smtp_from")]
    pub from: String,
    /// Base URL used to build links in outgoing mail.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "GradeTrack <no-reply@gradetrack.example>".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_smtp_from(),
            base_url: default_base_url(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Security policy settings.
    #[serde(default)]
    pub security: SecurityConfig,
    /// SMTP settings.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| GradetrackError::Config(e.to_string()))
    }
}
