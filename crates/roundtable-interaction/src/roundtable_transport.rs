//! HTTP implementation of [`RoundtableTransport`].

use crate::client::{ApiClient, send_checked, transport_error};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Method;
use reqwest::header::ACCEPT;
use roundtable_core::error::Result;
use roundtable_core::roundtable::{ByteStream, ChatRequest, RoundtableTransport};

#[derive(Clone, Debug)]
pub struct HttpRoundtableTransport {
    api: ApiClient,
}

impl HttpRoundtableTransport {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RoundtableTransport for HttpRoundtableTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let path = format!("roundtable/sessions/{}/chat", request.session_id);
        let builder = self
            .api
            .streaming_request(Method::POST, &path)
            .header(ACCEPT, "text/event-stream")
            .json(request);

        let response = send_checked(builder).await?;
        tracing::debug!(
            "[HttpRoundtableTransport] Stream opened for session {} ({})",
            request.session_id,
            response.status()
        );

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(transport_error))
            .boxed())
    }
}
