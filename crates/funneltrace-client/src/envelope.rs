//! List-endpoint response normalization.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use funneltrace_core::admin::PagedResponse;

use crate::error::ApiClientError;

/// The two shapes a list endpoint may answer with. Anything else is a
/// contract violation surfaced as [`ApiClientError::InvalidResponse`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PagedPayload<T> {
    Bare(Vec<T>),
    Envelope {
        items: Vec<T>,
        limit: Option<u32>,
        offset: Option<u32>,
    },
}

pub(crate) fn normalize_paged<T: DeserializeOwned>(
    payload: Value,
    endpoint: &str,
) -> Result<PagedResponse<T>, ApiClientError> {
    let parsed: PagedPayload<T> =
        serde_json::from_value(payload).map_err(|_| ApiClientError::InvalidResponse {
            endpoint: endpoint.to_string(),
        })?;

    Ok(match parsed {
        PagedPayload::Bare(items) => {
            let limit = items.len() as u32;
            PagedResponse {
                items,
                limit,
                offset: 0,
            }
        }
        PagedPayload::Envelope {
            items,
            limit,
            offset,
        } => {
            let limit = limit.unwrap_or(items.len() as u32);
            PagedResponse {
                items,
                limit,
                offset: offset.unwrap_or(0),
            }
        }
    })
}
