//! # Message Store
//!
//! Ordered, append-only log of chat turns. The store is the single owner of
//! `Message` values; every mutation goes through `update()` in action.rs, so
//! there is exactly one logical writer.
//!
//! Display order always equals insertion order (oldest first). Messages are
//! never removed individually — the whole set is replaced on session switch
//! or history load.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed annotation appended to the in-progress assistant message when a
/// stream ends in failure. Partial content is kept; this marker is the only
/// user-visible trace of the error inside the transcript.
pub const STREAM_ERROR_NOTICE: &str = "\n[通信エラーが発生しました]";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "あなた",
            Role::Assistant => "カルテ",
        }
    }
}

/// One chat turn. The id is opaque and stable: the trailing assistant
/// message keeps its id for the whole stream cycle, so the presentation
/// layer can anchor on it while content grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl Message {
    /// A user turn. Content is frozen at creation — nothing appends to it.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            content: content.into(),
        }
    }

    /// The empty assistant placeholder appended at submit time, before the
    /// network call resolves. Fragments accumulate into it.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            content: String::new(),
        }
    }

    /// A history turn with a freshly synthesized local id.
    pub fn from_history(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
        }
    }
}

/// Generate a new opaque local message id.
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
    /// `append_to_last` was called on an empty store.
    Empty,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Empty => write!(f, "no trailing message to extend"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append a message at the tail.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Extend the tail message's content. The tail's id is untouched, so
    /// content only ever grows under a stable identity.
    pub fn append_to_last(&mut self, fragment: &str) -> Result<(), StoreError> {
        let last = self.messages.last_mut().ok_or(StoreError::Empty)?;
        last.content.push_str(fragment);
        Ok(())
    }

    /// Full ordered replacement, used when loading history.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Index of the most recent message with the given role, if any.
    /// This is the anchor lookup used by the scroll and filler logic.
    pub fn last_index_of(&self, role: Role) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut store = MessageStore::new();
        store.push(Message::user("first"));
        store.push(Message::assistant_placeholder());
        store.push(Message::user("second"));

        let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "", "second"]);
    }

    #[test]
    fn test_append_to_last_grows_content() {
        let mut store = MessageStore::new();
        store.push(Message::assistant_placeholder());
        let id_before = store.last().unwrap().id.clone();

        store.append_to_last("痛み").unwrap();
        store.append_to_last("について").unwrap();

        let last = store.last().unwrap();
        assert_eq!(last.content, "痛みについて");
        assert_eq!(last.id, id_before, "trailing id must stay stable during a stream");
    }

    #[test]
    fn test_append_to_last_on_empty_store_fails() {
        let mut store = MessageStore::new();
        assert_eq!(store.append_to_last("x"), Err(StoreError::Empty));
    }

    #[test]
    fn test_replace_all_swaps_entire_set() {
        let mut store = MessageStore::new();
        store.push(Message::user("old"));

        store.replace_all(vec![
            Message::from_history(Role::User, "a"),
            Message::from_history(Role::Assistant, "b"),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].content, "a");
        assert_eq!(store.messages()[1].content, "b");
    }

    #[test]
    fn test_last_index_of_finds_most_recent_role() {
        let mut store = MessageStore::new();
        store.push(Message::user("q1"));
        store.push(Message::from_history(Role::Assistant, "a1"));
        store.push(Message::user("q2"));
        store.push(Message::assistant_placeholder());

        assert_eq!(store.last_index_of(Role::User), Some(2));
        assert_eq!(store.last_index_of(Role::Assistant), Some(3));

        store.clear();
        assert_eq!(store.last_index_of(Role::User), None);
    }

    #[test]
    fn test_history_messages_get_fresh_ids() {
        let a = Message::from_history(Role::User, "same");
        let b = Message::from_history(Role::User, "same");
        assert_ne!(a.id, b.id);
    }
}
