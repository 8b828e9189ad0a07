// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the admin guard service.
//!
//! Every value can be overridden from the environment:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `LOGIN_WINDOW_MS`: Login rate limit window in milliseconds (default: 120000)
//! - `LOGIN_MAX_ATTEMPTS`: Admitted login attempts per window (default: 1)
//! - `SWEEP_INTERVAL_SECS`: Expired record sweep period (default: 600)
//! - `ADMIN_USERNAME`: Admin account name (default: admin)
//! - `ADMIN_PASSWORD_HASH`: Argon2 PHC hash of the admin password
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated origins, empty allows any
//! - `METRICS_ENABLED`: Serve Prometheus metrics (default: true)

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the admin guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Login rate limiting configuration
    #[serde(default)]
    pub login_limit: LoginLimitConfig,

    /// Admin account configuration
    #[serde(default)]
    pub admin: AdminConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Rate limiting applied to the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginLimitConfig {
    /// Window length in milliseconds (default: 120000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Admitted attempts per window (default: 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Prefix joined to the client address to build the limiter key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Period of the expired record sweep in seconds (default: 600)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Admin account credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Admin username (default: admin)
    #[serde(default = "default_admin_username")]
    pub username: String,

    /// Argon2 PHC string for the admin password
    #[serde(default)]
    pub password_hash: Option<String>,
}

/// Cross-origin settings for the admin UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_window_ms() -> u64 {
    120_000 // 2 minutes
}

fn default_max_attempts() -> u32 {
    1
}

fn default_key_prefix() -> String {
    "login_".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    600 // 10 minutes
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            login_limit: LoginLimitConfig::default(),
            admin: AdminConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for LoginLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_attempts: default_max_attempts(),
            key_prefix: default_key_prefix(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password_hash: None,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl LoginLimitConfig {
    /// Get the rate limit window duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Get the sweep period
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Limiter key for a client identifier.
    pub fn key_for(&self, client: &str) -> String {
        format!("{}{}", self.key_prefix, client)
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults. The result is
    /// validated before it is returned.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            login_limit: LoginLimitConfig {
                window_ms: parse_var(&lookup, "LOGIN_WINDOW_MS")
                    .unwrap_or(defaults.login_limit.window_ms),
                max_attempts: parse_var(&lookup, "LOGIN_MAX_ATTEMPTS")
                    .unwrap_or(defaults.login_limit.max_attempts),
                sweep_interval_secs: parse_var(&lookup, "SWEEP_INTERVAL_SECS")
                    .unwrap_or(defaults.login_limit.sweep_interval_secs),
                ..defaults.login_limit
            },
            admin: AdminConfig {
                username: lookup("ADMIN_USERNAME").unwrap_or(defaults.admin.username),
                password_hash: lookup("ADMIN_PASSWORD_HASH").filter(|v| !v.trim().is_empty()),
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|v| {
                        v.split(',')
                            .map(|s| s.trim())
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the rate limiter cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.login_limit.window_ms == 0 {
            return Err(AppError::Config(
                "LOGIN_WINDOW_MS must be greater than zero".to_string(),
            ));
        }
        if self.login_limit.max_attempts == 0 {
            return Err(AppError::Config(
                "LOGIN_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.login_limit.sweep_interval_secs == 0 {
            return Err(AppError::Config(
                "SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a variable, treating missing or malformed values as unset.
fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
