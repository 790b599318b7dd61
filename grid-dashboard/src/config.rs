//! Configuration management for the dashboard client

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{DashboardError, Result};

/// Fallback backend origin outside the browser (the bot's default bind)
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";

/// Key/value lookup the configuration is read from.
///
/// The browser reads `data-*` attributes of `<body>`; tests use a map.
pub trait ConfigSource {
    fn var(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// How many times a 401 may trigger a re-prompt within one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRetryPolicy {
    /// At most `n` prompt-and-retry rounds, then `Unauthenticated`
    Bounded(u32),
    /// Keep prompting until the backend accepts the credentials
    Unbounded,
}

impl AuthRetryPolicy {
    /// Whether another retry is permitted after `retries` have been spent
    pub fn allows(self, retries: u32) -> bool {
        match self {
            AuthRetryPolicy::Bounded(limit) => retries < limit,
            AuthRetryPolicy::Unbounded => true,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("unlimited") {
            return Some(AuthRetryPolicy::Unbounded);
        }
        raw.parse().ok().map(AuthRetryPolicy::Bounded)
    }
}

impl Default for AuthRetryPolicy {
    fn default() -> Self {
        AuthRetryPolicy::Unbounded
    }
}

/// Dashboard client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin of the trading bot backend, without trailing slash
    pub api_base: String,

    /// Log level
    pub log_level: String,

    /// Seconds between scheduled dashboard refreshes
    pub refresh_interval_seconds: u64,

    /// 401 handling
    pub auth_retry: AuthRetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            log_level: "info".to_string(),
            refresh_interval_seconds: 60,
            auth_retry: AuthRetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults for absent or unparsable keys
    pub fn from_source(source: &impl ConfigSource) -> Self {
        Self::from_source_with_base(source, DEFAULT_API_BASE)
    }

    /// Same as [`Config::from_source`] with a caller-chosen default origin
    pub fn from_source_with_base(source: &impl ConfigSource, default_base: &str) -> Self {
        Self {
            api_base: source
                .var("API_BASE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default_base.to_string())
                .trim()
                .trim_end_matches('/')
                .to_string(),

            log_level: source.var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            refresh_interval_seconds: source
                .var("REFRESH_INTERVAL_SECONDS")
                .map(|v| v.trim().parse().unwrap_or(60))
                .unwrap_or(60),

            auth_retry: source
                .var("AUTH_RETRY_LIMIT")
                .and_then(|v| AuthRetryPolicy::parse(&v))
                .unwrap_or_default(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Parsed `log_level`, `Info` when unrecognised
    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(DashboardError::Config(format!(
                "api_base must be an http(s) origin, got '{}'",
                self.api_base
            )));
        }
        if self.refresh_interval_seconds == 0 {
            return Err(DashboardError::Config("refresh_interval_seconds must be positive".into()));
        }
        Ok(())
    }
}
