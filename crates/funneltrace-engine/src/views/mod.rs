pub mod dashboard;
pub mod events;
pub mod sessions;
pub mod trace;
