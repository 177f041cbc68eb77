//! HTTP client abstraction for testability.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;

use super::RouteError;

/// Boxed future returned by [`HttpClient::get`].
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<Bytes, RouteError>> + Send + 'a>>;

/// Trait for HTTP GET operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with a 30 second request timeout.
    pub fn new() -> Result<Self, RouteError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a new client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, RouteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RouteError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| RouteError::Http(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RouteError::Http(format!("HTTP {} from {}", status, url)));
            }

            response
                .bytes()
                .await
                .map_err(|e| RouteError::Http(format!("Failed to read response: {}", e)))
        })
    }
}
