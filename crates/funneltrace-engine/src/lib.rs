//! Correlation and aggregation engine.
//!
//! Turns the backend's independently paginated collections (sessions,
//! events, orders, integration logs) into dashboard statistics, enriched
//! table rows and per-session trace timelines. Fetch orchestration lives
//! next to each view; all derivation is pure over already-fetched data.

pub mod concurrency;
pub mod loader;
pub mod resolver;
pub mod views;
