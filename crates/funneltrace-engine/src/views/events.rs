//! Events table view.

use std::collections::{HashMap, HashSet};

use anyhow::Result;

use funneltrace_core::admin::{
    AdminApi, EventRecord, EventsParams, EventsTableRow, PagedResponse, SessionDetail,
    SessionSummary, SessionsParams,
};

use crate::resolver::resolve_session_details;
use crate::views::sessions::SESSION_DETAILS_CONCURRENCY;

/// Window of the secondary sessions lookup. The events page and this lookup
/// are fetched independently and may cover different slices of time, so an
/// event's session legitimately may not be present; the join tolerates that
/// as null columns.
pub const EVENTS_SESSION_LOOKUP_LIMIT: u32 = 500;

/// Fetch one events page plus the sessions lookup window, resolve a detail
/// per distinct event id, and join everything into table rows.
pub async fn load_events_view<A>(
    api: &A,
    params: &EventsParams,
) -> Result<PagedResponse<EventsTableRow>>
where
    A: AdminApi + ?Sized,
{
    let lookup_params = SessionsParams {
        range: params.range.clone(),
        utm_source: None,
        limit: Some(EVENTS_SESSION_LOOKUP_LIMIT),
        offset: Some(0),
    };
    let (events_page, sessions_page) = tokio::try_join!(
        api.list_events(params),
        api.list_sessions(&lookup_params),
    )?;

    let unique_ids = distinct_event_ids(&events_page.items);
    let details = resolve_session_details(api, &unique_ids, SESSION_DETAILS_CONCURRENCY).await?;

    let rows = build_event_rows(
        &events_page.items,
        &sessions_page.items,
        &unique_ids,
        &details,
    );
    Ok(PagedResponse {
        items: rows,
        limit: events_page.limit,
        offset: events_page.offset,
    })
}

/// Distinct correlation keys in first-seen order, so detail resolution runs
/// once per session even when a page holds many events of the same visit.
fn distinct_event_ids(events: &[EventRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for event in events {
        if seen.insert(event.event_id.clone()) {
            ids.push(event.event_id.clone());
        }
    }
    ids
}

/// Pure join: events against the sessions lookup (attribution columns) and
/// against resolved details keyed by `detail_ids` (first order id). Every
/// miss is a null column, never an error.
pub fn build_event_rows(
    events: &[EventRecord],
    session_lookup: &[SessionSummary],
    detail_ids: &[String],
    details: &[Option<SessionDetail>],
) -> Vec<EventsTableRow> {
    let sessions_by_id: HashMap<&str, &SessionSummary> = session_lookup
        .iter()
        .map(|session| (session.event_id.as_str(), session))
        .collect();
    let order_ids: HashMap<&str, Option<String>> = detail_ids
        .iter()
        .zip(details)
        .map(|(event_id, detail)| {
            let order_id = detail
                .as_ref()
                .and_then(|detail| detail.orders.first())
                .map(|order| order.id.clone());
            (event_id.as_str(), order_id)
        })
        .collect();

    events
        .iter()
        .map(|event| {
            let session = sessions_by_id.get(event.event_id.as_str());
            EventsTableRow {
                event: event.clone(),
                landing_path: session.and_then(|s| s.landing_path.clone()),
                utm_source: session.and_then(|s| s.utm_source.clone()),
                utm_medium: session.and_then(|s| s.utm_medium.clone()),
                utm_campaign: session.and_then(|s| s.utm_campaign.clone()),
                gclid: session.and_then(|s| s.gclid.clone()),
                fbclid: session.and_then(|s| s.fbclid.clone()),
                order_id: order_ids
                    .get(event.event_id.as_str())
                    .cloned()
                    .flatten(),
            }
        })
        .collect()
}
