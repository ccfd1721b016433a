pub mod chat;
pub mod sessions;

use anyhow::Result;
use roundtable_core::config::ClientConfig;
use roundtable_interaction::{ApiClient, HttpSessionGateway};

pub fn session_gateway(config: &ClientConfig) -> Result<HttpSessionGateway> {
    Ok(HttpSessionGateway::new(ApiClient::from_config(config)?))
}
