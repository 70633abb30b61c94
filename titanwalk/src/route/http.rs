//! HTTP client abstraction for testability.
//!
//! The directions provider talks to its endpoint through this trait so
//! tests can inject canned responses instead of the network.

use std::future::Future;
use std::time::Duration;

use super::provider::DirectionsError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for async HTTP GET operations.
pub trait AsyncHttpClient: Send + Sync {
    /// Perform an HTTP GET request and return the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, DirectionsError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self, DirectionsError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, DirectionsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DirectionsError::Http(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, DirectionsError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DirectionsError::Http(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DirectionsError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| DirectionsError::Http(format!("Failed to read response body: {e}")))
    }
}
