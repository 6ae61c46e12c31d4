//! Dashboard aggregation over sessions, orders and integration logs.

use std::collections::BTreeMap;

use anyhow::Result;

use funneltrace_core::admin::{
    AdminApi, DashboardStats, DateRange, FunnelMetrics, IntegrationLogRecord, OrderRecord,
    OrderStatusCount, RevenuePoint, SessionDetail, SessionSummary, CRM_INTEGRATION,
    GA4_INTEGRATION, META_INTEGRATION,
};
use funneltrace_core::status::{
    business_status, is_failed_order, is_integration_success, is_success_order, UNKNOWN_STATUS,
};

use crate::loader::load_all_sessions;
use crate::resolver::resolve_session_details;

pub const DASHBOARD_SESSIONS_PAGE_SIZE: u32 = 100;
pub const DASHBOARD_MAX_SESSIONS: usize = 1000;
pub const DASHBOARD_DETAIL_CONCURRENCY: usize = 6;

/// Fetch and aggregate one dashboard snapshot for the given range.
///
/// The metrics summary and the session full scan run concurrently; either
/// failing fails the whole computation. Individual detail fetches degrade
/// to "unknown" instead (see [`resolve_session_details`]).
pub async fn load_dashboard_stats<A>(api: &A, range: &DateRange) -> Result<DashboardStats>
where
    A: AdminApi + ?Sized,
{
    let (metrics, sessions) = tokio::try_join!(
        api.get_metrics(range),
        load_all_sessions(
            api,
            range,
            DASHBOARD_MAX_SESSIONS,
            DASHBOARD_SESSIONS_PAGE_SIZE
        ),
    )?;

    let event_ids: Vec<String> = sessions
        .iter()
        .map(|session| session.event_id.clone())
        .collect();
    let details = resolve_session_details(api, &event_ids, DASHBOARD_DETAIL_CONCURRENCY).await?;

    Ok(compute_dashboard_stats(&metrics, &sessions, &details))
}

/// Pure aggregation fold. `details` is index-aligned with `sessions`;
/// `None` entries are sessions whose detail could not be resolved.
pub fn compute_dashboard_stats(
    metrics: &FunnelMetrics,
    sessions: &[SessionSummary],
    details: &[Option<SessionDetail>],
) -> DashboardStats {
    let orders: Vec<&OrderRecord> = details
        .iter()
        .flatten()
        .flat_map(|detail| &detail.orders)
        .collect();
    let integrations: Vec<IntegrationLogRecord> = details
        .iter()
        .flatten()
        .flat_map(|detail| detail.integrations.iter().cloned())
        .collect();

    // A session is unknown when its detail is unresolved or carries no
    // orders; both degrade the same way in the status distribution.
    let unknown_sessions = details
        .iter()
        .filter(|detail| detail.as_ref().is_none_or(|d| d.orders.is_empty()))
        .count() as i64;

    let total_events =
        metrics.landing_view + metrics.click_cta + metrics.begin_checkout + metrics.purchase;

    let mut success_orders = 0i64;
    let mut failed_orders = 0i64;
    let mut revenue = 0f64;
    let mut orders_by_status: BTreeMap<String, i64> = BTreeMap::new();
    let mut revenue_by_day: BTreeMap<String, f64> = BTreeMap::new();

    for order in &orders {
        let status = business_status(order);
        *orders_by_status.entry(status.clone()).or_insert(0) += 1;

        if is_success_order(&status) {
            success_orders += 1;
            revenue += order.amount;
            let day = order.created_at.format("%Y-%m-%d").to_string();
            *revenue_by_day.entry(day).or_insert(0.0) += order.amount;
        } else if is_failed_order(&status) {
            failed_orders += 1;
        }
    }

    if unknown_sessions > 0 {
        *orders_by_status
            .entry(UNKNOWN_STATUS.to_string())
            .or_insert(0) += unknown_sessions;
    }

    DashboardStats {
        total_sessions: sessions.len() as i64,
        total_events,
        total_orders: orders.len() as i64,
        unknown_sessions,
        conversion_rate: metrics.conversion_rate,
        success_orders,
        failed_orders,
        revenue,
        ga4_health: resolve_integration_health(&integrations, GA4_INTEGRATION),
        meta_health: resolve_integration_health(&integrations, META_INTEGRATION),
        pipedrive_health: resolve_integration_health(&integrations, CRM_INTEGRATION),
        orders_by_status: orders_by_status
            .into_iter()
            .map(|(status, total)| OrderStatusCount { status, total })
            .collect(),
        revenue_by_day: revenue_by_day
            .into_iter()
            .map(|(date, revenue)| RevenuePoint { date, revenue })
            .collect(),
    }
}

/// Success percentage of one integration's non-skipped delivery attempts.
///
/// Rows whose status is exactly "SKIPPED" (case-insensitive) were never
/// attempted and do not count. With no attempted rows at all the health is
/// undefined: `None`, never zero.
pub fn resolve_integration_health(
    rows: &[IntegrationLogRecord],
    integration: &str,
) -> Option<f64> {
    let attempted: Vec<&IntegrationLogRecord> = rows
        .iter()
        .filter(|row| row.integration == integration && !row.status.eq_ignore_ascii_case("SKIPPED"))
        .collect();
    if attempted.is_empty() {
        return None;
    }

    let successes = attempted
        .iter()
        .filter(|row| is_integration_success(&row.status))
        .count();
    Some(successes as f64 / attempted.len() as f64 * 100.0)
}
