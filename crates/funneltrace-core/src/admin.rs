//! Admin read-API abstraction.
//!
//! Wire entities mirror the tracking backend's JSON (camelCase) exactly.
//! `eventId` is the sole correlation key joining a session to its events,
//! orders and integration-delivery logs; no entity collection is assumed to
//! be sorted, de-duplicated or complete relative to another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Integration tag for the GA4 measurement-protocol sender.
pub const GA4_INTEGRATION: &str = "GA4_MP";
/// Integration tag for the Meta conversions-API sender.
pub const META_INTEGRATION: &str = "META_CAPI";
/// Integration tag for the Pipedrive CRM sender. Excluded from trace
/// timelines; its delivery health is still reported on the dashboard.
pub const CRM_INTEGRATION: &str = "PIPEDRIVE";

/// Optional `from`/`to` bounds applied uniformly to admin queries.
/// Serialized as RFC 3339 instants on the wire.
#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionsParams {
    pub range: DateRange,
    pub utm_source: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct EventsParams {
    pub range: DateRange,
    pub event_type: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Normalized page of a list endpoint. The backend answers either a bare
/// array or `{items, limit, offset}`; the client folds both into this shape.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub limit: u32,
    pub offset: u32,
}

/// One visitor session, keyed by `event_id`. Read-only projection; the
/// attribution fields are captured once on landing and never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub event_id: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
    pub landing_path: Option<String>,
    pub user_agent: Option<String>,
    pub ip_hash: Option<String>,
}

/// One tracked funnel event. `event_type` is open-ended: the four funnel
/// stages are well known ("landing_view", "click_cta", "begin_checkout",
/// "purchase") but unknown types must be tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub event_id: String,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
    pub currency: Option<String>,
    pub value: Option<f64>,
    /// Opaque serialized JSON. Parsed lazily and best-effort only.
    pub payload_json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    pub event_id: Option<String>,
    pub stripe_session_id: String,
    pub payment_intent_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    /// Raw payment-provider status. Classification happens in
    /// [`crate::status::business_status`], never here.
    pub status: String,
    pub business_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationLogRecord {
    pub id: String,
    pub integration: String,
    pub reference_id: Option<String>,
    /// Free-form delivery status. The literal "SKIPPED" means the delivery
    /// was intentionally not attempted and is excluded from health ratios.
    pub status: String,
    pub http_status: Option<i32>,
    pub latency_ms: Option<i64>,
    pub request_payload: Option<String>,
    pub response_payload: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Immutable per-session snapshot fetched on demand. Older backend versions
/// omit `integrations` entirely, so it defaults to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session: SessionSummary,
    pub events: Vec<EventRecord>,
    pub orders: Vec<OrderRecord>,
    #[serde(default)]
    pub integrations: Vec<IntegrationLogRecord>,
}

/// Funnel-stage raw counts computed upstream by the backend, plus its own
/// conversion rate. Totals derive from these counts, not from the sampled
/// session details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelMetrics {
    pub landing_view: i64,
    pub click_cta: i64,
    pub begin_checkout: i64,
    pub purchase: i64,
    pub conversion_rate: f64,
    pub orphan_failed_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusCount {
    pub status: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub revenue: f64,
}

/// Dashboard aggregate. Computed fresh per query; no identity, no partial
/// or streaming variant. `orders_by_status` and `revenue_by_day` are emitted
/// in sorted key order so recomputing over an unchanged snapshot is
/// bit-identical.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sessions: i64,
    pub total_events: i64,
    pub total_orders: i64,
    pub unknown_sessions: i64,
    pub conversion_rate: f64,
    pub success_orders: i64,
    pub failed_orders: i64,
    pub revenue: f64,
    /// Success percentage of non-skipped deliveries, `None` when no delivery
    /// was ever attempted (reported as not-applicable, never as zero).
    pub ga4_health: Option<f64>,
    pub meta_health: Option<f64>,
    pub pipedrive_health: Option<f64>,
    pub orders_by_status: Vec<OrderStatusCount>,
    pub revenue_by_day: Vec<RevenuePoint>,
}

/// Sessions-table row: the session plus columns lifted from its first
/// fetched order. Integration status columns are placeholders reserved for
/// per-row delivery states.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTableRow {
    #[serde(flatten)]
    pub session: SessionSummary,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub business_status: String,
    pub ga4_status: String,
    pub meta_status: String,
    pub pipedrive_status: String,
}

/// Events-table row: the event plus attribution columns looked up from the
/// sessions window and the first associated order id. Every lookup miss is
/// `None`, never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsTableRow {
    #[serde(flatten)]
    pub event: EventRecord,
    pub landing_path: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
    pub order_id: Option<String>,
}

/// One step of a session trace timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub payload: serde_json::Value,
}

/// Cross-system identifiers for one session, pulled from the first order
/// and the Meta delivery response. Missing values render as "-" or "N/A".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSummary {
    pub event_id: String,
    pub order_id: String,
    pub payment_intent_id: String,
    pub stripe_session_id: String,
    pub transaction_id: String,
    pub fbtrace_id: String,
}

/// Everything the trace view consumes for one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTrace {
    pub detail: SessionDetail,
    pub timeline: Vec<TraceStep>,
    pub correlation: CorrelationSummary,
}

/// The four read endpoints of the tracking backend, as consumed by the
/// aggregation engine. Implementations own transport, auth and response
/// shape validation; the engine never sees a raw HTTP response.
#[async_trait::async_trait]
pub trait AdminApi: Send + Sync + 'static {
    async fn get_metrics(&self, range: &DateRange) -> anyhow::Result<FunnelMetrics>;

    async fn list_sessions(
        &self,
        params: &SessionsParams,
    ) -> anyhow::Result<PagedResponse<SessionSummary>>;

    async fn list_events(
        &self,
        params: &EventsParams,
    ) -> anyhow::Result<PagedResponse<EventRecord>>;

    async fn get_session_detail(&self, event_id: &str) -> anyhow::Result<SessionDetail>;
}
