//! # Stream Ingestion
//!
//! Turns an open [`ChatStream`] into `Action`s for the event loop: one
//! `StreamFragment` per non-empty decoded piece, then `StreamDone` or
//! `StreamFailed`. The ingestor never touches the message store itself —
//! the single-writer rule lives in `update()`.
//!
//! Chunks arrive with arbitrary byte boundaries, so decoding is stateful:
//! [`StreamDecoder`] holds an incomplete multi-byte UTF-8 sequence across
//! reads and only emits text once the sequence completes. A definitively
//! invalid sequence is a terminal decode failure; an incomplete tail at
//! end-of-stream is dropped with a warning, matching the behavior of a
//! streaming text decoder.

use std::fmt;
use std::sync::mpsc::Sender;

use log::{debug, warn};

use crate::api::chat::{ChatStream, StreamError};
use crate::core::action::Action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Byte offset within the pending buffer where the invalid sequence begins.
    pub valid_up_to: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid UTF-8 sequence at byte {}", self.valid_up_to)
    }
}

impl std::error::Error for DecodeError {}

/// Incremental UTF-8 decoder. Bytes that end mid-character stay pending
/// until the next chunk completes them.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the maximal valid prefix of pending + chunk. Returns the
    /// decoded text (possibly empty when the chunk ends mid-character).
    pub fn feed(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        self.pending.extend_from_slice(chunk);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let out = text.to_string();
                self.pending.clear();
                Ok(out)
            }
            Err(e) => {
                if e.error_len().is_some() {
                    // Not a boundary artifact — the bytes can never decode.
                    return Err(DecodeError {
                        valid_up_to: e.valid_up_to(),
                    });
                }
                let valid = e.valid_up_to();
                let tail = self.pending.split_off(valid);
                let prefix = std::mem::replace(&mut self.pending, tail);
                // The prefix was validated up to `valid`, so this is lossless.
                Ok(String::from_utf8_lossy(&prefix).into_owned())
            }
        }
    }

    /// Number of bytes still waiting for a sequence completion.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Drives one stream cycle to completion, forwarding events to the event
/// loop. Consumes itself — one ingestor per submit.
pub struct StreamIngestor<S> {
    stream: S,
    decoder: StreamDecoder,
}

impl<S: ChatStream> StreamIngestor<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: StreamDecoder::new(),
        }
    }

    pub async fn run(mut self, tx: Sender<Action>) {
        let mut fragment_count = 0usize;
        let mut total_len = 0usize;

        loop {
            match self.stream.next_chunk().await {
                Ok(Some(chunk)) => match self.decoder.feed(&chunk) {
                    Ok(text) if !text.is_empty() => {
                        fragment_count += 1;
                        total_len += text.len();
                        debug!(
                            "Fragment {} decoded ({} bytes, total {})",
                            fragment_count,
                            text.len(),
                            total_len
                        );
                        if tx.send(Action::StreamFragment(text)).is_err() {
                            warn!("Fragment dropped: receiver gone");
                            return;
                        }
                    }
                    // Chunk ended mid-character; nothing to emit yet.
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Stream decode failed: {e}");
                        let _ = tx.send(Action::StreamFailed(StreamError::Decode(e.to_string())));
                        return;
                    }
                },
                Ok(None) => {
                    if self.decoder.pending_len() > 0 {
                        warn!(
                            "Stream ended with {} undecodable trailing byte(s), dropped",
                            self.decoder.pending_len()
                        );
                    }
                    debug!(
                        "Stream complete: {} fragments, {} bytes",
                        fragment_count, total_len
                    );
                    let _ = tx.send(Action::StreamDone);
                    return;
                }
                Err(e) => {
                    warn!("Stream failed after {} fragments: {e}", fragment_count);
                    let _ = tx.send(Action::StreamFailed(e));
                    return;
                }
            }
        }
    }
}
