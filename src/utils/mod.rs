//! Utility modules.
//!
//! - [`HttpClient`]: shared reqwest client with the generation timeout

mod http;

pub use http::{HttpClient, DEFAULT_TIMEOUT};
