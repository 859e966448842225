//! Runtime configuration loaded from the environment
//!
//! - `DATABASE_URL` (or `MONGODB_URI`): connection string, checked on first use
//! - `EVENTBOOK_MAX_CONNECTIONS`: pool size (default: 5)
//! - `EVENTBOOK_CONNECT_TIMEOUT_SECS`: bound on connection establishment (default/0: none)
//! - `POSTHOG_API_KEY` / `POSTHOG_HOST`: analytics delivery (optional)

use std::time::Duration;

/// Default maximum connections for the pool.
/// Kept low; the widget issues one insert per submission.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default PostHog ingestion host.
pub const DEFAULT_POSTHOG_HOST: &str = "https://us.i.posthog.com";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string. `None` is reported when a connection is first needed.
    pub url: Option<String>,

    pub max_connections: u32,

    /// Upper bound for a single connection attempt. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: None,
        }
    }
}

impl DatabaseConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let url = non_empty_var("DATABASE_URL").or_else(|| non_empty_var("MONGODB_URI"));

        let max_connections = non_empty_var("EVENTBOOK_MAX_CONNECTIONS")
            .and_then(|v| parse_var("EVENTBOOK_MAX_CONNECTIONS", &v))
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let connect_timeout = non_empty_var("EVENTBOOK_CONNECT_TIMEOUT_SECS")
            .and_then(|v| parse_var("EVENTBOOK_CONNECT_TIMEOUT_SECS", &v))
            .and_then(connect_timeout_from_secs);

        Self {
            url,
            max_connections,
            connect_timeout,
        }
    }

    /// Config with an explicit connection string (for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// PostHog analytics configuration
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub api_key: String,
    pub host: String,
}

impl AnalyticsConfig {
    /// Returns `None` when no API key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_var("POSTHOG_API_KEY")?;
        let host =
            non_empty_var("POSTHOG_HOST").unwrap_or_else(|| DEFAULT_POSTHOG_HOST.to_string());
        Some(Self { api_key, host })
    }

    /// Capture endpoint for this host
    pub fn capture_url(&self) -> String {
        format!("{}/capture/", self.host.trim_end_matches('/'))
    }
}

/// Connection timeout from a number of seconds. `0` means no timeout.
pub fn connect_timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value, "Ignoring unparseable environment variable");
            None
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
