//! Configuration module for healthboard.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// HTTP port for the dashboard server (default: 8081)
    pub http_port: u16,
    /// Base URL of the metrics backend (default: "http://localhost:8080")
    pub backend_url: String,
    /// URL the new-target form posts to (default: "<backend_url>/target")
    pub target_url: String,
    /// Relative time range passed to every metrics query (default: "-10m")
    pub duration: String,
    /// Delay between two refreshes of a widget (default: 10s)
    pub refresh_interval: Duration,
    /// Delay before a form message is cleared (default: 15s)
    pub message_clear_delay: Duration,
    /// Number of consecutive absences before a chart dataset is dropped.
    /// Zero keeps datasets forever (default: 0)
    pub evict_after: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            http_port: 8081,
            backend_url: "http://localhost:8080".to_string(),
            target_url: "http://localhost:8080/target".to_string(),
            duration: "-10m".to_string(),
            refresh_interval: Duration::from_secs(10),
            message_clear_delay: Duration::from_secs(15),
            evict_after: 0,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HEALTHBOARD_HTTP_PORT`: HTTP port (default: 8081)
    /// - `HEALTHBOARD_BACKEND_URL`: metrics backend base URL
    /// - `HEALTHBOARD_TARGET_URL`: target creation endpoint (default: backend + "/target")
    /// - `HEALTHBOARD_DURATION`: metrics query range (default: "-10m")
    /// - `HEALTHBOARD_REFRESH_SECS`: widget refresh period (default: 10)
    /// - `HEALTHBOARD_MESSAGE_CLEAR_SECS`: form message lifetime (default: 15)
    /// - `HEALTHBOARD_EVICT_AFTER`: stale dataset eviction, 0 disables (default: 0)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(port) = parse_var(&lookup, "HEALTHBOARD_HTTP_PORT") {
            cfg.http_port = port;
        }

        if let Some(backend_url) = lookup("HEALTHBOARD_BACKEND_URL") {
            cfg.backend_url = backend_url.trim_end_matches('/').to_string();
        }

        cfg.target_url = lookup("HEALTHBOARD_TARGET_URL")
            .unwrap_or_else(|| format!("{}/target", cfg.backend_url));

        if let Some(duration) = lookup("HEALTHBOARD_DURATION") {
            if !duration.is_empty() {
                cfg.duration = duration;
            }
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "HEALTHBOARD_REFRESH_SECS") {
            if secs > 0 {
                cfg.refresh_interval = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = parse_var(&lookup, "HEALTHBOARD_MESSAGE_CLEAR_SECS") {
            cfg.message_clear_delay = Duration::from_secs(secs);
        }

        if let Some(n) = parse_var(&lookup, "HEALTHBOARD_EVICT_AFTER") {
            cfg.evict_after = n;
        }

        cfg
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}
