//! # Sessions
//!
//! Session identity and the local session list.
//!
//! Ids embed their creation time (`20240613_212417`) and are immutable.
//! Names default to a human-readable timestamp and are editable any time;
//! a name always resolves non-empty, falling back to the id.
//!
//! The list is client-authoritative for the current interaction: creates and
//! renames apply locally first and persist fire-and-forget. A successful
//! directory refresh replaces the list wholesale, except the active session
//! is re-inserted if the server does not know it yet.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Canonical session representation. Every directory payload shape is
/// resolved into this at the ingress boundary (api::types); nothing
/// downstream branches on payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
}

impl Session {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = resolve_name(&id, &name.into());
        Self { id, name }
    }

    /// A brand-new session stamped at `now`: time-embedding id plus the
    /// default display name.
    pub fn created_at(now: DateTime<Local>) -> Self {
        Self {
            id: session_id_at(now),
            name: default_session_name(now),
        }
    }
}

/// Short time-embedding identifier, e.g. `20240613_212417`.
pub fn session_id_at(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Human-readable default display name, e.g. `2024年06月13日 21時24分17秒`.
pub fn default_session_name(now: DateTime<Local>) -> String {
    now.format("%Y年%m月%d日 %H時%M分%S秒").to_string()
}

/// Trim the raw name; an empty result falls back to the id so a display
/// name can never be blank.
pub fn resolve_name(id: &str, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        id.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Default)]
pub struct SessionList {
    sessions: Vec<Session>,
}

impl SessionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Append a newly created session at the tail.
    pub fn push(&mut self, session: Session) {
        self.sessions.push(session);
    }

    /// Wholesale replacement from a directory refresh. `active` is kept in
    /// the list even when the server payload lacks it (its registration is
    /// fire-and-forget and may not have landed).
    pub fn replace_with(&mut self, fetched: Vec<Session>, active: Option<&Session>) {
        self.sessions = fetched;
        if let Some(current) = active
            && !self.sessions.iter().any(|s| s.id == current.id)
        {
            self.sessions.push(current.clone());
        }
    }

    /// Optimistic local rename. Returns the resolved name (empty input falls
    /// back to the id) when the session exists, so the caller can persist
    /// the same value the user now sees.
    pub fn rename(&mut self, id: &str, raw_name: &str) -> Option<String> {
        let session = self.sessions.iter_mut().find(|s| s.id == id)?;
        let resolved = resolve_name(id, raw_name);
        session.name = resolved.clone();
        Some(resolved)
    }
}
