//! # Actions
//!
//! Everything that can happen in Karte becomes an `Action`.
//! User presses Enter? That's `Action::Submit`.
//! A fragment decodes? That's `Action::StreamFragment`.
//!
//! The `update()` function applies an action to the current state and
//! returns an `Effect` for the adapter to execute. No I/O here — spawning
//! the request, starting the scroll glide, and talking to the directory all
//! happen in the TUI layer. Because every mutation of the message store
//! flows through this one function on the event-loop thread, the store has
//! a single logical writer by construction.

use chrono::Local;
use log::{debug, warn};

use crate::api::chat::StreamError;
use crate::api::types::WireMessage;
use crate::core::message::{Message, STREAM_ERROR_NOTICE};
use crate::core::session::Session;
use crate::core::state::App;

#[derive(Debug)]
pub enum Action {
    /// The user submitted input text.
    Submit(String),
    /// One decoded fragment of the in-flight answer.
    StreamFragment(String),
    /// The answer stream reached its natural end.
    StreamDone,
    /// The cycle ended in failure (network, decode, server, abort).
    StreamFailed(StreamError),
    /// A directory refresh completed.
    SessionsLoaded(Vec<Session>),
    /// A history fetch completed.
    HistoryLoaded {
        session_id: String,
        turns: Vec<WireMessage>,
    },
    /// Start a fresh chat.
    NewSession,
    /// Switch to an existing session.
    OpenSession(String),
    /// Rename a session (optimistic local, then persisted).
    RenameSession { id: String, name: String },
    Quit,
}

/// What the adapter must do after an update. At most one effect per action;
/// `StartCycle` covers both spawning the request and starting the scroll
/// glide, which begin together at submit.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    /// Spawn the stream task and start the scroll animation toward the new
    /// user anchor.
    StartCycle,
    /// Fire-and-forget session list refresh.
    RefreshSessions,
    /// Fire-and-forget registration of a freshly created session.
    RegisterSession { id: String, name: String },
    /// Fire-and-forget rename persistence (already applied locally).
    PersistRename { id: String, name: String },
    /// Fetch history for the newly opened session.
    FetchHistory(String),
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            if text.trim().is_empty() || app.is_loading {
                return Effect::None;
            }
            // The user's turn is visible immediately, before the network
            // call resolves; its content is frozen from here on.
            app.store.push(Message::user(text));
            app.store.push(Message::assistant_placeholder());
            app.is_loading = true;
            app.is_thinking = true;
            Effect::StartCycle
        }

        Action::StreamFragment(text) => {
            if text.is_empty() {
                return Effect::None;
            }
            if let Err(e) = app.store.append_to_last(&text) {
                warn!("Dropped fragment: {e}");
                return Effect::None;
            }
            if app.is_thinking {
                app.is_thinking = false;
            }
            Effect::None
        }

        Action::StreamDone => {
            app.is_loading = false;
            // Covers the stream that ended without ever producing output.
            app.is_thinking = false;
            debug!("Cycle complete for session {}", app.current_session.id);
            Effect::RefreshSessions
        }

        Action::StreamFailed(error) => {
            // Partial content is kept; the sentinel is the only trace of
            // the failure inside the transcript.
            if let Err(e) = app.store.append_to_last(STREAM_ERROR_NOTICE) {
                warn!("No trailing message for error notice: {e}");
            }
            app.is_loading = false;
            app.is_thinking = false;
            app.status_message = format!("Stream failed: {error}");
            Effect::RefreshSessions
        }

        Action::SessionsLoaded(sessions) => {
            app.sessions
                .replace_with(sessions, Some(&app.current_session));
            Effect::None
        }

        Action::NewSession => {
            if app.is_loading {
                return Effect::None;
            }
            let session = Session::created_at(Local::now());
            app.store.clear();
            app.current_session = session.clone();
            app.sessions.push(session.clone());
            Effect::RegisterSession {
                id: session.id,
                name: session.name,
            }
        }

        Action::OpenSession(id) => {
            if app.is_loading {
                return Effect::None;
            }
            app.store.clear();
            app.current_session = app
                .sessions
                .find(&id)
                .cloned()
                .unwrap_or_else(|| Session::new(id.clone(), id.clone()));
            Effect::FetchHistory(id)
        }

        Action::HistoryLoaded { session_id, turns } => {
            // The user may have switched again while the fetch was in
            // flight; only the active session's history lands.
            if session_id != app.current_session.id {
                debug!("Discarding stale history for {session_id}");
                return Effect::None;
            }
            let messages = turns
                .into_iter()
                .map(|t| Message::from_history(t.role, t.content))
                .collect();
            app.store.replace_all(messages);
            Effect::None
        }

        Action::RenameSession { id, name } => {
            let Some(resolved) = app.sessions.rename(&id, &name) else {
                return Effect::None;
            };
            if app.current_session.id == id {
                app.current_session.name = resolved.clone();
            }
            Effect::PersistRename { id, name: resolved }
        }

        Action::Quit => Effect::Quit,
    }
}
