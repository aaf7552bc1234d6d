//! Client configuration.

use std::time::Duration;

use crate::auth::Credentials;

/// Server used when none is given.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8111";

/// Per-request timeout used when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the build server.
    pub server_url: String,

    /// Authentication scheme and secrets.
    pub credentials: Credentials,

    /// Timeout applied to each request.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            server_url: server_url.into(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to set the timeout in seconds. Zero keeps the default.
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        if secs == 0 {
            return self;
        }
        self.with_timeout(Duration::from_secs(secs))
    }

    /// Server URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}
