//! Remote I/O for the Roundtable client: SSE decoding and HTTP
//! implementations of the core collaborator traits.

pub mod attachment_client;
pub mod client;
pub mod roundtable_transport;
pub mod session_gateway;
pub mod sse;

pub use attachment_client::HttpAttachmentService;
pub use client::ApiClient;
pub use roundtable_transport::HttpRoundtableTransport;
pub use session_gateway::HttpSessionGateway;
pub use sse::{SseDecoder, StreamEventDispatcher};
