//! Order and integration status taxonomy.

use crate::admin::OrderRecord;

/// Business statuses counted as a completed sale. Revenue sums over these
/// and nothing else.
pub const SUCCESS_ORDER_STATES: &[&str] = &["SUCCESS", "SUCCEEDED", "PAID"];

/// Business statuses counted as a failed sale.
pub const FAILED_ORDER_STATES: &[&str] = &["FAILED", "ERROR", "CANCELED"];

/// Delivery statuses counted as a successful integration attempt.
pub const SUCCESS_INTEGRATION_STATES: &[&str] = &["SENT", "SENT_WITH_WARNINGS"];

/// Fallback bucket for orders with no usable status and for sessions whose
/// detail could not be resolved.
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Classify an order into its business status: `businessStatus` wins over
/// the raw provider `status`, empty strings count as missing, and the result
/// is always upper-cased. Orders with neither field yield [`UNKNOWN_STATUS`].
pub fn business_status(order: &OrderRecord) -> String {
    let raw = order
        .business_status
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&order.status);
    if raw.is_empty() {
        UNKNOWN_STATUS.to_string()
    } else {
        raw.to_ascii_uppercase()
    }
}

/// Whether an already-classified status is in the SUCCESS partition.
pub fn is_success_order(status: &str) -> bool {
    SUCCESS_ORDER_STATES.contains(&status)
}

/// Whether an already-classified status is in the FAILED partition.
pub fn is_failed_order(status: &str) -> bool {
    FAILED_ORDER_STATES.contains(&status)
}

/// Whether a raw integration-log status counts as a successful delivery.
pub fn is_integration_success(status: &str) -> bool {
    SUCCESS_INTEGRATION_STATES.contains(&status.to_ascii_uppercase().as_str())
}
