//! # Application State
//!
//! Core business state for Karte. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── store: MessageStore        // conversation turns, single writer
//! ├── sessions: SessionList      // local session list (client-authoritative)
//! ├── current_session: Session   // active session identity
//! ├── is_loading: bool           // a submit cycle is in flight
//! ├── is_thinking: bool          // no visible output for this turn yet
//! └── status_message: String     // status bar text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use chrono::{DateTime, Local};

use crate::core::message::MessageStore;
use crate::core::session::{Session, SessionList};

pub struct App {
    pub store: MessageStore,
    pub sessions: SessionList,
    pub current_session: Session,
    /// True for the full request lifetime of a submit cycle. Submission is
    /// disabled while set, which is what makes the store single-writer.
    pub is_loading: bool,
    /// True from submit until the first non-empty fragment (or terminal
    /// end/error if none ever arrives). Transitions true→false exactly once
    /// per cycle.
    pub is_thinking: bool,
    pub status_message: String,
}

impl App {
    /// A fresh app with its initial session already established — a session
    /// id exists before any submission is possible.
    pub fn new(now: DateTime<Local>) -> Self {
        let current = Session::created_at(now);
        let mut sessions = SessionList::new();
        sessions.push(current.clone());
        Self {
            store: MessageStore::new(),
            sessions,
            current_session: current,
            is_loading: false,
            is_thinking: false,
            status_message: String::from("Welcome to Karte!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.status_message, "Welcome to Karte!");
        assert!(!app.is_loading);
        assert!(!app.is_thinking);
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_app_starts_with_active_session() {
        let app = test_app();
        assert_eq!(app.sessions.len(), 1);
        assert_eq!(app.sessions.get(0).unwrap().id, app.current_session.id);
    }
}
