//! # Backend Boundary
//!
//! Async trait seams over the remote consultation service, plus the wire
//! payload types. This is the only module that knows about `reqwest` and
//! endpoint paths; `core` consumes the traits.

pub mod chat;
pub mod directory;
pub mod types;

pub use chat::{ChatService, ChatStream, HttpChatService, PollingChatService, StreamError};
pub use directory::{DirectoryError, HttpSessionDirectory, SessionDirectory};
pub use types::WireMessage;
