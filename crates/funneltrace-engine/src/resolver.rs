//! Per-key session-detail resolution with local fault tolerance.

use anyhow::Result;
use tracing::warn;

use funneltrace_core::admin::{AdminApi, SessionDetail};

use crate::concurrency::map_with_concurrency;

/// Resolve each correlation key to its [`SessionDetail`], or to `None` when
/// the fetch fails for that key (network, not-found, malformed response).
///
/// Output is index-aligned with `event_ids`. A single key's failure never
/// aborts the batch; the aggregation layer counts unresolved keys as
/// "unknown" instead of dropping them. Keys are expected to be already
/// de-duplicated by the caller.
pub async fn resolve_session_details<A>(
    api: &A,
    event_ids: &[String],
    concurrency: usize,
) -> Result<Vec<Option<SessionDetail>>>
where
    A: AdminApi + ?Sized,
{
    map_with_concurrency(event_ids, concurrency, |event_id, _| async move {
        match api.get_session_detail(&event_id).await {
            Ok(detail) => Ok(Some(detail)),
            Err(error) => {
                warn!(
                    event_id = %event_id,
                    error = %error,
                    "session detail fetch failed; treating session as unresolved"
                );
                Ok(None)
            }
        }
    })
    .await
}
