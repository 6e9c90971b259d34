//! Nexus client configuration and server connection settings.
//!
//! Timeouts default to one minute each, so a hung call is always bounded.
//! Override via environment variables or explicit construction for tests.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

/// HTTP client configuration shared by every Nexus call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds. `0` disables it.
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 60,
            timeout_secs: 60,
            user_agent: format!("nexus-push/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `NEXUS_PUSH_CONNECT_TIMEOUT_SECS` (default: 60)
    /// - `NEXUS_PUSH_TIMEOUT_SECS` (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            connect_timeout_secs: env_secs(
                "NEXUS_PUSH_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            timeout_secs: env_secs("NEXUS_PUSH_TIMEOUT_SECS", defaults.timeout_secs)?,
            user_agent: defaults.user_agent,
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn env_secs(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Username and password for HTTP Basic authentication.
///
/// The password buffer is zeroed on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Connection settings of one registered Nexus server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConnection {
    pub id: String,
    pub url: Url,
    pub credentials: Credentials,
}

impl ServerConnection {
    /// Build a connection, validating the base URL.
    pub fn new(
        id: impl Into<String>,
        url: &str,
        credentials: Credentials,
    ) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| ConfigError::InvalidUrl(url.to_string(), e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(
                url.to_string(),
                "URL cannot be used as a base".into(),
            ));
        }
        Ok(Self {
            id: id.into(),
            url: parsed,
            credentials,
        })
    }

    /// Base URL as written in metadata records, without a trailing slash.
    pub fn url_string(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),
    #[error("{0} must be a whole number of seconds, got {1:?}")]
    InvalidNumber(String, String),
}
