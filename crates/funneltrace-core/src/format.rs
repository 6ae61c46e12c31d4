//! Display formatting shared by timeline subtitles and the CLI.

use chrono::{DateTime, Utc};

/// Format a monetary amount as `"<CURRENCY> <amount>"` with two decimals.
/// Missing or non-finite amounts render as "-".
pub fn format_currency(amount: Option<f64>, currency: Option<&str>) -> String {
    match amount {
        Some(value) if value.is_finite() => {
            format!("{} {value:.2}", currency.unwrap_or("USD"))
        }
        _ => "-".to_string(),
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
