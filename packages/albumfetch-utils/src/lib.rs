pub mod http;

// Re-export main utilities
pub use http::{get, head, http_status_is_ok, ResponseData};
