use thiserror::Error;

/// Client-side errors for the admin read API.
///
/// Every variant is fatal to the query that raised it: callers that can
/// tolerate a missing item catch at the call site and degrade, the client
/// itself never does.
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid admin API base url: {url} (must be absolute http/https)")]
    InvalidBaseUrl { url: String },

    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status. `code`/`message`/`details`
    /// come from its `{error, message, details}` body when that body parses,
    /// with generic fallbacks otherwise.
    #[error("{endpoint} returned {status} ({code}): {message}")]
    Api {
        endpoint: String,
        status: u16,
        code: String,
        message: String,
        details: Vec<String>,
    },

    #[error(
        "invalid response from {endpoint}; check FUNNELTRACE_API_URL and backend availability"
    )]
    InvalidResponse { endpoint: String },
}
