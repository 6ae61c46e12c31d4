use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use funneltrace_core::admin::{
    AdminApi, DateRange, EventRecord, EventsParams, FunnelMetrics, IntegrationLogRecord,
    OrderRecord, PagedResponse, SessionDetail, SessionSummary, SessionsParams, GA4_INTEGRATION,
    META_INTEGRATION,
};
use funneltrace_engine::views::dashboard::{
    compute_dashboard_stats, load_dashboard_stats, resolve_integration_health,
};

fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid fixture timestamp")
        .with_timezone(&Utc)
}

fn sample_session(event_id: &str) -> SessionSummary {
    SessionSummary {
        event_id: event_id.to_string(),
        created_at: parse_ts("2024-01-01T09:00:00Z"),
        last_seen_at: parse_ts("2024-01-01T09:05:00Z"),
        utm_source: Some("newsletter".to_string()),
        utm_medium: Some("email".to_string()),
        utm_campaign: Some("launch".to_string()),
        utm_term: None,
        utm_content: None,
        gclid: None,
        fbclid: None,
        landing_path: Some("/".to_string()),
        user_agent: None,
        ip_hash: None,
    }
}

fn sample_order(amount: f64, business_status: &str, created_at: &str) -> OrderRecord {
    OrderRecord {
        id: uuid::Uuid::new_v4().to_string(),
        event_id: Some("evt_1".to_string()),
        stripe_session_id: "cs_test_1".to_string(),
        payment_intent_id: None,
        amount,
        currency: "USD".to_string(),
        status: "processed".to_string(),
        business_status: Some(business_status.to_string()),
        created_at: parse_ts(created_at),
    }
}

fn sample_log(integration: &str, status: &str) -> IntegrationLogRecord {
    IntegrationLogRecord {
        id: uuid::Uuid::new_v4().to_string(),
        integration: integration.to_string(),
        reference_id: None,
        status: status.to_string(),
        http_status: None,
        latency_ms: None,
        request_payload: None,
        response_payload: None,
        error_message: None,
        created_at: parse_ts("2024-01-01T09:03:00Z"),
    }
}

fn detail_with(
    event_id: &str,
    orders: Vec<OrderRecord>,
    integrations: Vec<IntegrationLogRecord>,
) -> SessionDetail {
    SessionDetail {
        session: sample_session(event_id),
        events: Vec::new(),
        orders,
        integrations,
    }
}

fn base_metrics() -> FunnelMetrics {
    FunnelMetrics {
        landing_view: 10,
        click_cta: 5,
        begin_checkout: 3,
        purchase: 2,
        conversion_rate: 20.0,
        orphan_failed_orders: 0,
    }
}

/// In-memory backend: serves sessions in offset order, details from a map,
/// and fails detail fetches for the configured keys.
struct FakeBackend {
    metrics: FunnelMetrics,
    sessions: Vec<SessionSummary>,
    details: HashMap<String, SessionDetail>,
    failing: HashSet<String>,
    metrics_unavailable: bool,
    detail_calls: AtomicUsize,
}

impl FakeBackend {
    fn new(sessions: Vec<SessionSummary>, details: Vec<SessionDetail>) -> Self {
        Self {
            metrics: base_metrics(),
            sessions,
            details: details
                .into_iter()
                .map(|detail| (detail.session.event_id.clone(), detail))
                .collect(),
            failing: HashSet::new(),
            metrics_unavailable: false,
            detail_calls: AtomicUsize::new(0),
        }
    }

    fn failing(mut self, event_id: &str) -> Self {
        self.failing.insert(event_id.to_string());
        self
    }

    fn without_metrics(mut self) -> Self {
        self.metrics_unavailable = true;
        self
    }
}

#[async_trait::async_trait]
impl AdminApi for FakeBackend {
    async fn get_metrics(&self, _range: &DateRange) -> anyhow::Result<FunnelMetrics> {
        if self.metrics_unavailable {
            return Err(anyhow!("metrics endpoint unreachable"));
        }
        Ok(self.metrics.clone())
    }

    async fn list_sessions(
        &self,
        params: &SessionsParams,
    ) -> anyhow::Result<PagedResponse<SessionSummary>> {
        let limit = params.limit.unwrap_or(50) as usize;
        let offset = params.offset.unwrap_or(0) as usize;
        let start = offset.min(self.sessions.len());
        let end = (start + limit).min(self.sessions.len());
        Ok(PagedResponse {
            items: self.sessions[start..end].to_vec(),
            limit: limit as u32,
            offset: offset as u32,
        })
    }

    async fn list_events(
        &self,
        _params: &EventsParams,
    ) -> anyhow::Result<PagedResponse<EventRecord>> {
        Err(anyhow!("not used by the dashboard"))
    }

    async fn get_session_detail(&self, event_id: &str) -> anyhow::Result<SessionDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(event_id) {
            return Err(anyhow!("backend unavailable"));
        }
        self.details
            .get(event_id)
            .cloned()
            .ok_or_else(|| anyhow!("session not found"))
    }
}

#[test]
fn revenue_counts_success_class_orders_only() {
    let sessions = vec![sample_session("e1")];
    let details = vec![Some(detail_with(
        "e1",
        vec![
            sample_order(100.0, "SUCCESS", "2024-01-01T10:00:00Z"),
            sample_order(50.0, "FAILED", "2024-01-01T11:00:00Z"),
        ],
        vec![],
    ))];

    let stats = compute_dashboard_stats(&base_metrics(), &sessions, &details);

    assert_eq!(stats.revenue, 100.0);
    assert_eq!(stats.success_orders, 1);
    assert_eq!(stats.failed_orders, 1);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.unknown_sessions, 0);
    assert_eq!(stats.revenue_by_day.len(), 1);
    assert_eq!(stats.revenue_by_day[0].date, "2024-01-01");
    assert_eq!(stats.revenue_by_day[0].revenue, 100.0);
}

#[test]
fn unresolved_detail_degrades_to_the_unknown_bucket() {
    let sessions = vec![sample_session("e1"), sample_session("e2")];
    let details = vec![
        Some(detail_with(
            "e1",
            vec![sample_order(10.0, "SUCCESS", "2024-01-01T10:00:00Z")],
            vec![],
        )),
        None,
    ];

    let stats = compute_dashboard_stats(&base_metrics(), &sessions, &details);

    assert_eq!(stats.unknown_sessions, 1);
    let unknown = stats
        .orders_by_status
        .iter()
        .find(|bucket| bucket.status == "UNKNOWN")
        .expect("unknown bucket present");
    assert_eq!(unknown.total, 1);
}

#[test]
fn zero_order_detail_counts_as_unknown_too() {
    let sessions = vec![sample_session("e1")];
    let details = vec![Some(detail_with("e1", vec![], vec![]))];

    let stats = compute_dashboard_stats(&base_metrics(), &sessions, &details);

    assert_eq!(stats.unknown_sessions, 1);
    assert_eq!(stats.total_orders, 0);
}

#[test]
fn unknown_sessions_add_to_orders_already_classified_unknown() {
    let sessions = vec![sample_session("e1"), sample_session("e2")];
    let details = vec![
        // An order with no usable status lands in UNKNOWN on its own.
        Some(detail_with(
            "e1",
            vec![OrderRecord {
                business_status: None,
                status: String::new(),
                ..sample_order(10.0, "SUCCESS", "2024-01-01T10:00:00Z")
            }],
            vec![],
        )),
        None,
    ];

    let stats = compute_dashboard_stats(&base_metrics(), &sessions, &details);

    let unknown = stats
        .orders_by_status
        .iter()
        .find(|bucket| bucket.status == "UNKNOWN")
        .expect("unknown bucket present");
    assert_eq!(unknown.total, 2, "order bucket plus unresolved session");
}

#[test]
fn non_partitioned_statuses_pass_through_as_their_own_buckets() {
    let sessions = vec![sample_session("e1")];
    let details = vec![Some(detail_with(
        "e1",
        vec![
            sample_order(10.0, "refunded", "2024-01-01T10:00:00Z"),
            sample_order(20.0, "succeeded", "2024-01-01T10:00:00Z"),
        ],
        vec![],
    ))];

    let stats = compute_dashboard_stats(&base_metrics(), &sessions, &details);

    let statuses: Vec<&str> = stats
        .orders_by_status
        .iter()
        .map(|bucket| bucket.status.as_str())
        .collect();
    assert_eq!(statuses, vec!["REFUNDED", "SUCCEEDED"]);
    assert_eq!(stats.success_orders, 1);
    assert_eq!(stats.failed_orders, 0);
    assert_eq!(stats.revenue, 20.0);
}

#[test]
fn total_events_come_from_the_metrics_summary_not_the_sample() {
    let stats = compute_dashboard_stats(&base_metrics(), &[], &[]);
    assert_eq!(stats.total_events, 20);
    assert_eq!(stats.conversion_rate, 20.0);
}

#[test]
fn daily_revenue_series_is_sorted_ascending_by_day() {
    let sessions = vec![sample_session("e1")];
    let details = vec![Some(detail_with(
        "e1",
        vec![
            sample_order(30.0, "PAID", "2024-01-03T10:00:00Z"),
            sample_order(10.0, "PAID", "2024-01-01T10:00:00Z"),
            sample_order(20.0, "PAID", "2024-01-01T23:59:59Z"),
        ],
        vec![],
    ))];

    let stats = compute_dashboard_stats(&base_metrics(), &sessions, &details);

    let series: Vec<(&str, f64)> = stats
        .revenue_by_day
        .iter()
        .map(|point| (point.date.as_str(), point.revenue))
        .collect();
    assert_eq!(series, vec![("2024-01-01", 30.0), ("2024-01-03", 30.0)]);
}

#[test]
fn recomputation_over_an_unchanged_snapshot_is_identical() {
    let sessions = vec![sample_session("e1"), sample_session("e2")];
    let details = vec![
        Some(detail_with(
            "e1",
            vec![
                sample_order(100.0, "SUCCESS", "2024-01-01T10:00:00Z"),
                sample_order(5.0, "refunded", "2024-01-02T10:00:00Z"),
            ],
            vec![sample_log(GA4_INTEGRATION, "SENT")],
        )),
        None,
    ];

    let first = compute_dashboard_stats(&base_metrics(), &sessions, &details);
    let second = compute_dashboard_stats(&base_metrics(), &sessions, &details);
    assert_eq!(first, second);
}

#[test]
fn revenue_is_invariant_under_order_list_reordering() {
    let orders = vec![
        sample_order(10.0, "SUCCESS", "2024-01-01T10:00:00Z"),
        sample_order(20.0, "PAID", "2024-01-02T10:00:00Z"),
        sample_order(30.0, "FAILED", "2024-01-02T11:00:00Z"),
    ];
    let mut reversed = orders.clone();
    reversed.reverse();

    let sessions = vec![sample_session("e1")];
    let forward = compute_dashboard_stats(
        &base_metrics(),
        &sessions,
        &[Some(detail_with("e1", orders, vec![]))],
    );
    let backward = compute_dashboard_stats(
        &base_metrics(),
        &sessions,
        &[Some(detail_with("e1", reversed, vec![]))],
    );

    assert_eq!(forward.revenue, backward.revenue);
    assert_eq!(forward.revenue_by_day, backward.revenue_by_day);
    assert_eq!(forward.orders_by_status, backward.orders_by_status);
}

#[test]
fn skipped_only_integrations_report_not_applicable_health() {
    let rows = vec![sample_log(GA4_INTEGRATION, "SKIPPED")];
    assert_eq!(resolve_integration_health(&rows, GA4_INTEGRATION), None);
    assert_eq!(resolve_integration_health(&[], META_INTEGRATION), None);
}

#[test]
fn integration_health_is_the_success_share_of_attempted_rows() {
    let rows = vec![
        sample_log(GA4_INTEGRATION, "SENT"),
        sample_log(GA4_INTEGRATION, "FAILED"),
        sample_log(GA4_INTEGRATION, "skipped"),
        sample_log(META_INTEGRATION, "SENT_WITH_WARNINGS"),
    ];
    assert_eq!(
        resolve_integration_health(&rows, GA4_INTEGRATION),
        Some(50.0)
    );
    assert_eq!(
        resolve_integration_health(&rows, META_INTEGRATION),
        Some(100.0)
    );
}

#[tokio::test]
async fn metrics_failure_fails_the_whole_computation() {
    let backend = FakeBackend::new(vec![sample_session("e1")], vec![]).without_metrics();
    let result = load_dashboard_stats(&backend, &DateRange::default()).await;
    assert!(result.is_err(), "metrics are not degradable");
}

#[tokio::test]
async fn load_dashboard_stats_pages_resolves_and_degrades() {
    // 150 sessions forces two loader pages at the built-in page size of 100.
    let sessions: Vec<SessionSummary> = (0..150)
        .map(|i| sample_session(&format!("evt_{i}")))
        .collect();
    let details: Vec<SessionDetail> = (0..150)
        .map(|i| {
            detail_with(
                &format!("evt_{i}"),
                vec![sample_order(1.0, "SUCCESS", "2024-01-01T10:00:00Z")],
                vec![sample_log(GA4_INTEGRATION, "SENT")],
            )
        })
        .collect();
    // One detail fetch fails; the computation must survive and count it.
    let backend = FakeBackend::new(sessions, details).failing("evt_7");

    let stats = load_dashboard_stats(&backend, &DateRange::default())
        .await
        .expect("dashboard aggregation succeeds despite one bad detail");

    assert_eq!(stats.total_sessions, 150);
    assert_eq!(stats.unknown_sessions, 1);
    assert_eq!(stats.success_orders, 149);
    assert_eq!(stats.revenue, 149.0);
    assert_eq!(stats.ga4_health, Some(100.0));
    assert_eq!(
        backend.detail_calls.load(Ordering::SeqCst),
        150,
        "one detail fetch per retrieved session"
    );
}
