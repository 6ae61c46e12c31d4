use std::time::Duration;

/// Connection settings for the admin read API, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the tracking backend, e.g. "https://api.example.com".
    pub base_url: String,
    /// Optional bearer token forwarded as `Authorization: Bearer <token>`.
    /// Token issuance/refresh is out of scope; an already-issued token is
    /// forwarded verbatim.
    pub bearer_token: Option<String>,
    pub timeout_ms: u64,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            base_url: std::env::var("FUNNELTRACE_API_URL")
                .map_err(|_| "FUNNELTRACE_API_URL is required".to_string())?,
            bearer_token: std::env::var("FUNNELTRACE_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            timeout_ms: std::env::var("FUNNELTRACE_HTTP_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
