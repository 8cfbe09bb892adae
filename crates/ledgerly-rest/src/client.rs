//! PostgREST HTTP client
//!
//! Provides a typed HTTP client for a PostgREST-compatible expense API.
//! Handles authentication headers, per-request timeouts, and the mapping of
//! transport and status failures into the [`RemoteError`] taxonomy.
//!
//! ## Error classification
//!
//! - Connect/DNS failures → `NetworkUnavailable` (retryable)
//! - Request timeout → `ServerError` (retryable)
//! - 401 / 403 → `NotAuthenticated` (terminal)
//! - Other 4xx → `ConstraintViolation` (terminal)
//! - 5xx → `ServerError` (retryable)

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use ledgerly_core::ports::RemoteError;

/// PostgREST error body, e.g. `{"code":"23505","message":"duplicate key ..."}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Postgres error code for a unique-constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// HTTP client for the remote expense API
///
/// Wraps `reqwest::Client` with the project API key, a bearer access token,
/// and base URL construction.
pub struct RestClient {
    /// The underlying HTTP client, configured with the request timeout
    client: Client,
    /// Base URL for API requests, no trailing slash
    base_url: String,
    /// Project API key sent with every request
    api_key: String,
    /// Current access token; `None` means no session
    access_token: Option<String>,
}

impl RestClient {
    /// Creates a new client against `base_url` with the given per-request
    /// timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        })
    }

    /// Creates a client with a short timeout against a custom base URL
    /// (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: "test-key".to_string(),
            access_token: Some("test-token".to_string()),
        }
    }

    /// Updates the access token (e.g., after login or refresh)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
        debug!("Updated RestClient access token");
    }

    /// Returns the current access token, if any
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a request with auth headers for `path` under the base URL
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(RemoteError::NotAuthenticated)?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(token))
    }

    /// Sends a request, classifying transport failures
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        request.send().await.map_err(classify_transport)
    }

    /// Issues a bounded HEAD request against the base URL; true on any
    /// response (reachability, not correctness)
    pub async fn probe(&self) -> bool {
        self.client
            .head(&self.base_url)
            .header("apikey", &self.api_key)
            .send()
            .await
            .is_ok()
    }
}

/// Maps a transport-level `reqwest::Error` into the error taxonomy
fn classify_transport(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::ServerError(format!("request timed out: {err}"))
    } else {
        RemoteError::NetworkUnavailable(err.to_string())
    }
}

/// Maps a non-success HTTP status plus its body into the error taxonomy
///
/// Returns `Ok(true)` when the status encodes a duplicate idempotency token
/// (the caller treats it as an already-applied INSERT).
pub(crate) async fn classify_status(response: Response) -> Result<bool, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(false);
    }

    let body: ApiErrorBody = response
        .json()
        .await
        .unwrap_or(ApiErrorBody {
            code: None,
            message: None,
        });
    let message = body.message.unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::NotAuthenticated),
        StatusCode::CONFLICT if body.code.as_deref() == Some(UNIQUE_VIOLATION)
            && message.contains("local_id") =>
        {
            Ok(true)
        }
        s if s.is_client_error() => Err(RemoteError::ConstraintViolation(message)),
        _ => Err(RemoteError::ServerError(format!("{status}: {message}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = RestClient::with_base_url("http://localhost:8080/rest/v1/");
        assert_eq!(client.base_url(), "http://localhost:8080/rest/v1");
    }

    #[test]
    fn test_request_without_token_is_not_authenticated() {
        let mut client = RestClient::with_base_url("http://localhost:8080");
        client.access_token = None;
        let err = client.request(Method::GET, "expenses").unwrap_err();
        assert_eq!(err, RemoteError::NotAuthenticated);
    }
}
