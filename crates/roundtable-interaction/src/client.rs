//! Shared HTTP plumbing for the backend API.

use reqwest::{Client, Method, RequestBuilder, Response};
use roundtable_core::config::ClientConfig;
use roundtable_core::error::{Result, RoundtableError};
use serde::de::DeserializeOwned;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Base client holding the HTTP connection pool, base URL and credentials.
///
/// Cheap to clone; every endpoint client wraps one.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        // No client-wide timeout: it would also cut long-running event streams.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RoundtableError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            request_timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request with the per-call timeout applied.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.streaming_request(method, path)
            .timeout(self.request_timeout)
    }

    /// Request without a total timeout, for responses read incrementally.
    pub(crate) fn streaming_request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Sends a request and returns the response if its status is 2xx.
pub(crate) async fn send_checked(builder: RequestBuilder) -> Result<Response> {
    let response = builder.send().await.map_err(transport_error)?;
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(api_error(response).await)
    }
}

/// Sends a request and decodes the JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
    let response = send_checked(builder).await?;
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(RoundtableError::from)
}

pub(crate) fn transport_error(err: reqwest::Error) -> RoundtableError {
    RoundtableError::Transport {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

/// Builds an `Api` error, preferring the body's `detail` field.
pub(crate) async fn api_error(response: Response) -> RoundtableError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RoundtableError::api(status, error_detail(&body))
}

fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());

    match detail {
        Some(serde_json::Value::String(text)) => text,
        Some(other) => other.to_string(),
        None => body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_detail_field() {
        assert_eq!(error_detail(r#"{"detail":"File too large"}"#), "File too large");
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body"],"msg":"missing"}]}"#),
            r#"[{"loc":["body"],"msg":"missing"}]"#
        );
        assert_eq!(error_detail("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_detail(&"x".repeat(1000)).len(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn test_url_joining() {
        let api = ApiClient::new("http://localhost:8000/api/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(api.url("/files/upload"), "http://localhost:8000/api/files/upload");
        assert_eq!(api.url("roundtable/sessions"), "http://localhost:8000/api/roundtable/sessions");
    }
}
