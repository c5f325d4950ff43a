//! HTTP Client Abstraction
//!
//! The catalog API is read-only, so every request is a single GET.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{BridgeError, Result};

/// GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }
}

/// Async HTTP client trait
///
/// `execute` performs exactly one attempt with no overall timeout;
/// implementations never retry.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn fetch_data(client: &dyn HttpClient) -> Result<String> {
///     let response = client.execute(HttpRequest::get("http://localhost:23119/api/")).await?;
///     response.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    ///
    /// # Errors
    ///
    /// Returns error if the connection fails. Non-2xx responses are returned
    /// as `Ok` so callers can inspect the status.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}
