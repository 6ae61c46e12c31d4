//! HTTP implementation of the admin read API.

pub mod envelope;
pub mod error;
pub mod http;

pub use error::ApiClientError;
pub use http::HttpAdminApi;
