//! Session directory client.
//!
//! Every call here is best-effort by policy: list, create, rename, and
//! history failures are logged and swallowed by callers. The only
//! user-visible effect of a failure is a stale session list, which
//! self-corrects on the next successful refresh.

use std::fmt;

use async_trait::async_trait;
use log::{debug, warn};

use crate::api::types::{
    HistoryResponse, RegisterSessionRequest, RenameSessionRequest, SessionsResponse, WireMessage,
};
use crate::core::session::Session;

#[derive(Debug)]
pub enum DirectoryError {
    Network(String),
    Api { status: u16 },
    Parse(String),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::Network(msg) => write!(f, "network error: {msg}"),
            DirectoryError::Api { status } => write!(f, "directory error (HTTP {status})"),
            DirectoryError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Fetch and normalize the remote session list.
    async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError>;

    /// Register a freshly created session. Fire-and-forget from the
    /// caller's perspective.
    async fn create_session(&self, id: &str, name: &str) -> Result<(), DirectoryError>;

    /// Persist a rename. Fire-and-forget, no rollback on failure.
    async fn rename_session(&self, id: &str, name: &str) -> Result<(), DirectoryError>;

    /// Fetch a session's `{role, content}` history in original order.
    async fn history(&self, id: &str) -> Result<Vec<WireMessage>, DirectoryError>;
}

pub struct HttpSessionDirectory {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSessionDirectory {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn check(response: reqwest::Response) -> Result<reqwest::Response, DirectoryError> {
        let status = response.status();
        if !status.is_success() {
            warn!("Directory request failed: HTTP {status}");
            return Err(DirectoryError::Api {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SessionDirectory for HttpSessionDirectory {
    async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError> {
        let response = self
            .client
            .get(format!("{}/sessions", self.base_url))
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;
        let response = Self::check(response)?;

        let parsed: SessionsResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Parse(e.to_string()))?;

        // Both payload shapes collapse into the canonical Session here.
        let sessions: Vec<Session> = parsed.sessions.into_iter().map(Session::from).collect();
        debug!("Fetched {} sessions", sessions.len());
        Ok(sessions)
    }

    async fn create_session(&self, id: &str, name: &str) -> Result<(), DirectoryError> {
        let response = self
            .client
            .post(format!("{}/new_session", self.base_url))
            .json(&RegisterSessionRequest {
                session_id: id,
                name,
            })
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;
        Self::check(response)?;
        debug!("Registered session {id}");
        Ok(())
    }

    async fn rename_session(&self, id: &str, name: &str) -> Result<(), DirectoryError> {
        let response = self
            .client
            .post(format!("{}/update_session_name", self.base_url))
            .json(&RenameSessionRequest {
                session_id: id,
                name,
            })
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;
        Self::check(response)?;
        debug!("Renamed session {id} to {name}");
        Ok(())
    }

    async fn history(&self, id: &str) -> Result<Vec<WireMessage>, DirectoryError> {
        let response = self
            .client
            .get(format!("{}/history/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;
        let response = Self::check(response)?;

        let parsed: HistoryResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Parse(e.to_string()))?;
        Ok(parsed.history)
    }
}
