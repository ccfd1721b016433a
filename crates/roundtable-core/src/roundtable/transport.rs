//! Transport trait for the streaming chat call.

use super::request::ChatRequest;
use crate::error::{Result, RoundtableError};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Raw response body chunks. An `Err` item is a terminal transport failure.
pub type ByteStream = BoxStream<'static, std::result::Result<Vec<u8>, RoundtableError>>;

/// Opens the server-sent event stream for one exchange.
#[async_trait]
pub trait RoundtableTransport: Send + Sync {
    /// Sends `request` and returns the response body as a byte stream.
    ///
    /// A non-2xx status is reported as an error here, before any bytes are
    /// read.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream>;
}
