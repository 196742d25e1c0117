//! Wire types for the consultation backend.
//!
//! The session list endpoint historically returned bare id strings and later
//! `{id, name}` records; both shapes are still produced in the wild. They
//! are resolved into the canonical [`Session`] here, at the ingress
//! boundary — nothing downstream branches on payload shape.

use serde::{Deserialize, Serialize};

use crate::core::message::{Message, Role};
use crate::core::session::Session;

/// Body for `POST /chat`. The full ordered history travels with every
/// request; the backend is stateless about conversation content.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub messages: Vec<WireMessage>,
}

/// One `{role, content}` turn as it crosses the wire. Local ids never
/// leave the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Response of `GET /sessions`.
#[derive(Deserialize, Debug)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<SessionPayload>,
}

/// The two tolerated session-list shapes.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum SessionPayload {
    Bare(String),
    Record {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<SessionPayload> for Session {
    fn from(payload: SessionPayload) -> Self {
        match payload {
            SessionPayload::Bare(id) => {
                let name = id.clone();
                Session::new(id, name)
            }
            // A missing or empty name resolves to the id inside Session::new.
            SessionPayload::Record { id, name } => {
                let name = name.unwrap_or_default();
                Session::new(id, name)
            }
        }
    }
}

/// Response of `GET /history/{id}`.
#[derive(Deserialize, Debug)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<WireMessage>,
}

/// Body for `POST /new_session`.
#[derive(Serialize, Debug)]
pub struct RegisterSessionRequest<'a> {
    pub session_id: &'a str,
    pub name: &'a str,
}

/// Body for `POST /update_session_name`.
#[derive(Serialize, Debug)]
pub struct RenameSessionRequest<'a> {
    pub session_id: &'a str,
    pub name: &'a str,
}

/// Body for `POST /chat/poll` (polling transport).
#[derive(Serialize, Debug)]
pub struct PollRequest<'a> {
    pub session_id: &'a str,
}

/// One poll result: the next queued fragment, or nothing yet.
#[derive(Deserialize, Debug)]
pub struct PollResponse {
    pub chunk: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_roles_lowercase() {
        let request = ChatRequest {
            session_id: "20240613_212417",
            messages: vec![
                WireMessage {
                    role: Role::User,
                    content: "頭痛がします".to_string(),
                },
                WireMessage {
                    role: Role::Assistant,
                    content: "詳しく教えてください".to_string(),
                },
            ],
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""session_id":"20240613_212417""#));
        assert!(json.contains(r#""role":"user""#));
        assert!(json.contains(r#""role":"assistant""#));
    }

    #[test]
    fn test_sessions_response_bare_ids() {
        let json = r#"{"sessions":["20240601_090000","20240602_100000"]}"#;
        let parsed: SessionsResponse = serde_json::from_str(json).unwrap();
        let sessions: Vec<Session> = parsed.sessions.into_iter().map(Session::from).collect();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "20240601_090000");
        assert_eq!(sessions[0].name, "20240601_090000");
    }

    #[test]
    fn test_sessions_response_records_with_name_fallback() {
        let json = r#"{"sessions":[
            {"id":"a","name":"腹痛の相談"},
            {"id":"b","name":""},
            {"id":"c"}
        ]}"#;
        let parsed: SessionsResponse = serde_json::from_str(json).unwrap();
        let sessions: Vec<Session> = parsed.sessions.into_iter().map(Session::from).collect();

        assert_eq!(sessions[0].name, "腹痛の相談");
        assert_eq!(sessions[1].name, "b");
        assert_eq!(sessions[2].name, "c");
    }

    #[test]
    fn test_sessions_response_mixed_shapes() {
        let json = r#"{"sessions":["bare",{"id":"rec","name":"記録"}]}"#;
        let parsed: SessionsResponse = serde_json::from_str(json).unwrap();
        let sessions: Vec<Session> = parsed.sessions.into_iter().map(Session::from).collect();

        assert_eq!(sessions[0], Session::new("bare", "bare"));
        assert_eq!(sessions[1], Session::new("rec", "記録"));
    }

    #[test]
    fn test_sessions_response_missing_field_defaults_empty() {
        let parsed: SessionsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.sessions.is_empty());
    }

    #[test]
    fn test_history_response_preserves_order() {
        let json = r#"{"history":[
            {"role":"user","content":"q1"},
            {"role":"assistant","content":"a1"},
            {"role":"user","content":"q2"}
        ]}"#;
        let parsed: HistoryResponse = serde_json::from_str(json).unwrap();
        let contents: Vec<&str> = parsed.history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "a1", "q2"]);
    }

    #[test]
    fn test_poll_response_optional_chunk() {
        let some: PollResponse = serde_json::from_str(r#"{"chunk":"痛み"}"#).unwrap();
        assert_eq!(some.chunk.as_deref(), Some("痛み"));

        let none: PollResponse = serde_json::from_str(r#"{"chunk":null}"#).unwrap();
        assert!(none.chunk.is_none());
    }
}
