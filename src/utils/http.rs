//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Default whole-request timeout. Generation can take 10-20 seconds, so this
/// is well above the usual API timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with the default timeout
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(HttpClient::with_timeout(Duration::from_secs(5)).is_ok());
    }
}
