//! Sessions table view.

use anyhow::Result;

use funneltrace_core::admin::{
    AdminApi, PagedResponse, SessionDetail, SessionSummary, SessionTableRow, SessionsParams,
};
use funneltrace_core::status::{business_status, UNKNOWN_STATUS};

use crate::resolver::resolve_session_details;

pub const SESSION_DETAILS_CONCURRENCY: usize = 4;

/// Placeholder for the per-row integration status columns until per-row
/// delivery states are surfaced by the backend.
const INTEGRATION_STATUS_PLACEHOLDER: &str = "N/A";

/// Fetch one sessions page and enrich each row with columns from its
/// resolved detail. Unresolved details leave the row with empty order
/// columns and an UNKNOWN business status.
pub async fn load_sessions_view<A>(
    api: &A,
    params: &SessionsParams,
) -> Result<PagedResponse<SessionTableRow>>
where
    A: AdminApi + ?Sized,
{
    let page = api.list_sessions(params).await?;
    let event_ids: Vec<String> = page
        .items
        .iter()
        .map(|session| session.event_id.clone())
        .collect();
    let details = resolve_session_details(api, &event_ids, SESSION_DETAILS_CONCURRENCY).await?;

    let rows = build_session_rows(&page.items, &details);
    Ok(PagedResponse {
        items: rows,
        limit: page.limit,
        offset: page.offset,
    })
}

/// Pure join of a sessions page against index-aligned resolved details.
///
/// Surfaces the first order in fetch order when a session has several; the
/// backend's ordering contract for that list is unconfirmed, so which order
/// wins for a multi-order session is a known limitation of this view.
pub fn build_session_rows(
    sessions: &[SessionSummary],
    details: &[Option<SessionDetail>],
) -> Vec<SessionTableRow> {
    sessions
        .iter()
        .enumerate()
        .map(|(index, session)| {
            let first_order = details
                .get(index)
                .and_then(Option::as_ref)
                .and_then(|detail| detail.orders.first());

            SessionTableRow {
                session: session.clone(),
                amount: first_order.map(|order| order.amount),
                currency: first_order.map(|order| order.currency.clone()),
                business_status: first_order
                    .map(business_status)
                    .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
                ga4_status: INTEGRATION_STATUS_PLACEHOLDER.to_string(),
                meta_status: INTEGRATION_STATUS_PLACEHOLDER.to_string(),
                pipedrive_status: INTEGRATION_STATUS_PLACEHOLDER.to_string(),
            }
        })
        .collect()
}
