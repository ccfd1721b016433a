//! Session service trait.
//!
//! Defines the interface to the remote session persistence service.

use super::model::{CreateSessionRequest, Session};
use crate::error::Result;
use crate::settings::SessionSettings;
use async_trait::async_trait;

/// An abstract gateway to the session persistence service.
///
/// Decouples the roundtable logic from the concrete transport (HTTP in
/// production, in-memory maps in tests).
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Creates a session and returns it as stored by the service.
    async fn create(&self, request: &CreateSessionRequest) -> Result<Session>;

    /// Lists the sessions visible to the current user.
    async fn list(&self) -> Result<Vec<Session>>;

    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn get(&self, session_id: &str) -> Result<Option<Session>>;

    /// Ends a session. Ended sessions accept no further exchanges.
    async fn end(&self, session_id: &str) -> Result<()>;

    /// Replaces the persisted settings of a session.
    async fn patch_settings(&self, session_id: &str, settings: &SessionSettings) -> Result<()>;
}
