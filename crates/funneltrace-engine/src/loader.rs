//! Paginated full scan over the sessions collection.

use anyhow::Result;
use tracing::debug;

use funneltrace_core::admin::{AdminApi, DateRange, SessionSummary, SessionsParams};

/// Page through the sessions list until `max_rows` rows are accumulated, a
/// page comes back empty, or a page comes back shorter than requested (end
/// of data). The offset advances by the limit actually requested for the
/// last page, so the boundary page is neither skipped nor double-counted.
///
/// The cap deliberately bounds worst-case fetch volume for dashboard
/// aggregation; totals beyond it are undercounted.
pub async fn load_all_sessions<A>(
    api: &A,
    range: &DateRange,
    max_rows: usize,
    page_size: u32,
) -> Result<Vec<SessionSummary>>
where
    A: AdminApi + ?Sized,
{
    let mut rows: Vec<SessionSummary> = Vec::new();
    let mut offset: u32 = 0;

    while rows.len() < max_rows {
        let remaining = (max_rows - rows.len()) as u32;
        let limit = page_size.min(remaining);
        let params = SessionsParams {
            range: range.clone(),
            utm_source: None,
            limit: Some(limit),
            offset: Some(offset),
        };

        let page = api.list_sessions(&params).await?;
        let fetched = page.items.len();
        if fetched == 0 {
            break;
        }
        rows.extend(page.items);
        if fetched < limit as usize {
            break;
        }
        offset += limit;
    }

    debug!(rows = rows.len(), "session full scan complete");
    Ok(rows)
}
