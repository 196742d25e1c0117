//! Chat transports.
//!
//! Two interchangeable ways to receive an answer stream:
//!
//! - [`HttpChatService`]: `POST /chat`, the response body is the chunked
//!   byte stream, terminated by native end-of-stream.
//! - [`PollingChatService`]: polls `POST /chat/poll` at a fixed interval;
//!   each poll yields at most one queued fragment and the literal `[DONE]`
//!   token marks the end instead of a native stream end.
//!
//! Both hand the ingestor the same [`ChatStream`] contract, so the
//! append/cancel behavior downstream is identical.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use log::{debug, info, warn};

use crate::api::types::{ChatRequest, PollRequest, PollResponse, WireMessage};

/// Termination token of the polling byte-queue. Never forwarded downstream.
pub const POLL_DONE_TOKEN: &str = "[DONE]";

/// Terminal failures of one stream cycle. All variants are handled
/// identically at the ingest boundary: sentinel annotation, flags cleared,
/// no retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Network-level failure (timeout, DNS, connection reset).
    Network(String),
    /// The byte stream contained a definitively invalid UTF-8 sequence.
    Decode(String),
    /// The backend answered with a non-success status.
    Server { status: u16 },
    /// The client aborted the cycle (Esc, component teardown).
    Aborted,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Network(msg) => write!(f, "network error: {msg}"),
            StreamError::Decode(msg) => write!(f, "decode error: {msg}"),
            StreamError::Server { status } => write!(f, "server error (HTTP {status})"),
            StreamError::Aborted => write!(f, "aborted by client"),
        }
    }
}

impl std::error::Error for StreamError {}

/// An open answer stream: a sequence of byte chunks of arbitrary size.
/// `Ok(None)` is end-of-stream.
#[async_trait]
pub trait ChatStream: Send {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError>;
}

#[async_trait]
impl ChatStream for Box<dyn ChatStream> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        (**self).next_chunk().await
    }
}

/// Opens answer streams for a submit cycle.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn open(
        &self,
        session_id: &str,
        history: Vec<WireMessage>,
    ) -> Result<Box<dyn ChatStream>, StreamError>;
}

// ============================================================================
// HTTP streaming transport
// ============================================================================

pub struct HttpChatService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChatService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn open(
        &self,
        session_id: &str,
        history: Vec<WireMessage>,
    ) -> Result<Box<dyn ChatStream>, StreamError> {
        let request = ChatRequest {
            session_id,
            messages: history,
        };
        info!(
            "Opening chat stream: session={}, turns={}",
            session_id,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| StreamError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Chat response status: {status}");
        if !status.is_success() {
            warn!("Chat request rejected: HTTP {status}");
            return Err(StreamError::Server {
                status: status.as_u16(),
            });
        }

        Ok(Box::new(HttpChatStream {
            body: Box::pin(response.bytes_stream()),
        }))
    }
}

struct HttpChatStream {
    body: futures::stream::BoxStream<'static, reqwest::Result<Bytes>>,
}

#[async_trait]
impl ChatStream for HttpChatStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        match self.body.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(StreamError::Network(e.to_string())),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Polling byte-queue transport
// ============================================================================

pub struct PollingChatService {
    base_url: String,
    interval: Duration,
    client: reqwest::Client,
}

impl PollingChatService {
    pub fn new(base_url: String, interval: Duration) -> Self {
        Self {
            base_url,
            interval,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatService for PollingChatService {
    async fn open(
        &self,
        session_id: &str,
        history: Vec<WireMessage>,
    ) -> Result<Box<dyn ChatStream>, StreamError> {
        // The polling queue is fed server-side; the submit itself still goes
        // through /chat so the backend starts generating. The response body
        // is ignored — fragments arrive via the queue.
        let request = ChatRequest {
            session_id,
            messages: history,
        };
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| StreamError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Server {
                status: status.as_u16(),
            });
        }

        info!(
            "Polling chat queue: session={}, interval={:?}",
            session_id, self.interval
        );
        Ok(Box::new(PollingChatStream {
            url: format!("{}/chat/poll", self.base_url),
            session_id: session_id.to_string(),
            interval: self.interval,
            client: self.client.clone(),
            done: false,
        }))
    }
}

struct PollingChatStream {
    url: String,
    session_id: String,
    interval: Duration,
    client: reqwest::Client,
    done: bool,
}

#[async_trait]
impl ChatStream for PollingChatStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        if self.done {
            return Ok(None);
        }

        loop {
            tokio::time::sleep(self.interval).await;

            let response = self
                .client
                .post(self.url.as_str())
                .json(&PollRequest {
                    session_id: &self.session_id,
                })
                .send()
                .await
                .map_err(|e| StreamError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(StreamError::Server {
                    status: status.as_u16(),
                });
            }

            let poll: PollResponse = response
                .json()
                .await
                .map_err(|e| StreamError::Network(e.to_string()))?;

            match poll.chunk {
                Some(token) if token == POLL_DONE_TOKEN => {
                    debug!("Poll queue drained for session {}", self.session_id);
                    self.done = true;
                    return Ok(None);
                }
                Some(fragment) => return Ok(Some(Bytes::from(fragment))),
                // Queue momentarily empty; keep polling.
                None => continue,
            }
        }
    }
}
