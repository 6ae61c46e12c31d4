use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use funneltrace_core::admin::{
    AdminApi, DateRange, EventRecord, EventsParams, FunnelMetrics, PagedResponse, SessionDetail,
    SessionSummary, SessionsParams,
};
use funneltrace_core::config::ApiConfig;

use crate::envelope::normalize_paged;
use crate::error::ApiClientError;

const SESSIONS_ENDPOINT: &str = "/api/admin/sessions";
const EVENTS_ENDPOINT: &str = "/api/admin/events";
const METRICS_ENDPOINT: &str = "/api/admin/metrics";

const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

/// Error body the backend emits on non-2xx responses. Parsed best-effort;
/// a body that does not match still produces a typed error with fallbacks.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
    details: Option<Vec<String>>,
}

/// `reqwest`-backed [`AdminApi`] implementation.
///
/// One client instance per process: connection pooling and timeouts are
/// configured once at construction. No retries; a failed request surfaces
/// as a single error and the caller decides whether to degrade.
pub struct HttpAdminApi {
    client: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpAdminApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiClientError> {
        let base_url =
            Url::parse(config.base_url.trim()).map_err(|_| ApiClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
            })?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(ApiClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
            });
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout())
            .build()
            .map_err(ApiClientError::ClientBuild)?;

        Ok(Self {
            client,
            base_url,
            bearer_token: config.bearer_token.clone(),
        })
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn get_value(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ApiClientError> {
        let mut request = self.client.get(self.endpoint_url(path));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        debug!(endpoint = path, "admin API request");
        let response = request
            .send()
            .await
            .map_err(|source| ApiClientError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_api_error(path, status.as_u16(), &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|_| ApiClientError::InvalidResponse {
                endpoint: path.to_string(),
            })
    }
}

fn normalize_api_error(endpoint: &str, status: u16, body: &str) -> ApiClientError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let (code, message, details) = match parsed {
        Some(body) => (
            body.error.unwrap_or_else(|| "HTTP_ERROR".to_string()),
            body.message
                .unwrap_or_else(|| format!("request failed with status {status}")),
            body.details.unwrap_or_default(),
        ),
        None => (
            "HTTP_ERROR".to_string(),
            format!("request failed with status {status}"),
            Vec::new(),
        ),
    };
    ApiClientError::Api {
        endpoint: endpoint.to_string(),
        status,
        code,
        message,
        details,
    }
}

fn push_range_query(query: &mut Vec<(&'static str, String)>, range: &DateRange) {
    if let Some(from) = range.from {
        query.push(("from", from.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    if let Some(to) = range.to {
        query.push(("to", to.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
}

#[async_trait::async_trait]
impl AdminApi for HttpAdminApi {
    async fn get_metrics(&self, range: &DateRange) -> anyhow::Result<FunnelMetrics> {
        let mut query = Vec::new();
        push_range_query(&mut query, range);
        let value = self.get_value(METRICS_ENDPOINT, &query).await?;
        let metrics =
            serde_json::from_value(value).map_err(|_| ApiClientError::InvalidResponse {
                endpoint: METRICS_ENDPOINT.to_string(),
            })?;
        Ok(metrics)
    }

    async fn list_sessions(
        &self,
        params: &SessionsParams,
    ) -> anyhow::Result<PagedResponse<SessionSummary>> {
        let mut query = Vec::new();
        push_range_query(&mut query, &params.range);
        if let Some(utm_source) = &params.utm_source {
            query.push(("utm_source", utm_source.clone()));
        }
        if let Some(limit) = params.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = params.offset {
            query.push(("offset", offset.to_string()));
        }
        let value = self.get_value(SESSIONS_ENDPOINT, &query).await?;
        Ok(normalize_paged(value, SESSIONS_ENDPOINT)?)
    }

    async fn list_events(
        &self,
        params: &EventsParams,
    ) -> anyhow::Result<PagedResponse<EventRecord>> {
        let mut query = Vec::new();
        if let Some(event_type) = &params.event_type {
            query.push(("eventType", event_type.clone()));
        }
        push_range_query(&mut query, &params.range);
        if let Some(limit) = params.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = params.offset {
            query.push(("offset", offset.to_string()));
        }
        let value = self.get_value(EVENTS_ENDPOINT, &query).await?;
        Ok(normalize_paged(value, EVENTS_ENDPOINT)?)
    }

    async fn get_session_detail(&self, event_id: &str) -> anyhow::Result<SessionDetail> {
        let endpoint = format!("{SESSIONS_ENDPOINT}/{event_id}");
        let value = self.get_value(&endpoint, &[]).await?;
        let detail: SessionDetail =
            serde_json::from_value(value).map_err(|_| ApiClientError::InvalidResponse {
                endpoint: endpoint.clone(),
            })?;
        Ok(detail)
    }
}
