//! Client configuration

use std::time::Duration;

/// Configuration for the StrideLog API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the API (e.g., "https://api.stridelog.app/api")
    pub base_url: String,

    /// Path of the token refresh endpoint, relative to `base_url`
    pub refresh_path: String,

    /// Path prefix identifying authentication endpoints. A 401 from one of
    /// these never triggers a refresh attempt.
    pub auth_path_prefix: String,

    /// Default per-request timeout
    pub timeout: Duration,

    /// Default maximum number of retries after the initial attempt
    pub max_retries: u32,

    /// Default base delay for exponential backoff between retries
    pub retry_delay: Duration,

    /// Buffer capacity of the auth event bus
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            auth_path_prefix: "/auth/".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            event_capacity: 32,
        }
    }
}

impl ClientConfig {
    /// Join a path onto the configured base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Absolute URL of the refresh endpoint.
    pub fn refresh_url(&self) -> String {
        self.url(&self.refresh_path)
    }

    /// Whether the URL targets an authentication endpoint.
    pub fn is_auth_endpoint(&self, target: &str) -> bool {
        match url::Url::parse(target) {
            Ok(parsed) => parsed.path().contains(&self.auth_path_prefix),
            Err(_) => target.contains(&self.auth_path_prefix),
        }
    }
}
