//! HTTP implementation of [`SessionGateway`].

use crate::client::{ApiClient, send_checked, send_json};
use async_trait::async_trait;
use reqwest::Method;
use roundtable_core::error::Result;
use roundtable_core::session::{CreateSessionRequest, Session, SessionGateway};
use roundtable_core::settings::SessionSettings;
use serde::Deserialize;

const SESSIONS_PATH: &str = "roundtable/sessions";

/// Session service client over the backend REST API.
#[derive(Clone, Debug)]
pub struct HttpSessionGateway {
    api: ApiClient,
}

/// The list endpoint returns either a bare array or `{ "sessions": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SessionList {
    Bare(Vec<Session>),
    Wrapped { sessions: Vec<Session> },
}

impl HttpSessionGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SessionGateway for HttpSessionGateway {
    async fn create(&self, request: &CreateSessionRequest) -> Result<Session> {
        let session: Session =
            send_json(self.api.request(Method::POST, SESSIONS_PATH).json(request)).await?;
        tracing::info!("[HttpSessionGateway] Created session {}", session.id);
        Ok(session)
    }

    async fn list(&self) -> Result<Vec<Session>> {
        let list: SessionList = send_json(self.api.request(Method::GET, SESSIONS_PATH)).await?;
        Ok(match list {
            SessionList::Bare(sessions) | SessionList::Wrapped { sessions } => sessions,
        })
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let path = format!("{SESSIONS_PATH}/{session_id}");
        match send_json(self.api.request(Method::GET, &path)).await {
            Ok(session) => Ok(Some(session)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn end(&self, session_id: &str) -> Result<()> {
        let path = format!("{SESSIONS_PATH}/{session_id}/end");
        send_checked(self.api.request(Method::POST, &path)).await?;
        tracing::info!("[HttpSessionGateway] Ended session {}", session_id);
        Ok(())
    }

    async fn patch_settings(&self, session_id: &str, settings: &SessionSettings) -> Result<()> {
        let path = format!("{SESSIONS_PATH}/{session_id}/settings");
        send_checked(self.api.request(Method::PATCH, &path).json(settings)).await?;
        tracing::debug!("[HttpSessionGateway] Patched settings of session {}", session_id);
        Ok(())
    }
}
