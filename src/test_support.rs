//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::TimeZone;

use crate::api::chat::{ChatStream, StreamError};
use crate::core::state::App;

/// Creates a test App pinned to a fixed creation time.
pub fn test_app() -> App {
    let now = chrono::Local
        .with_ymd_and_hms(2024, 6, 13, 21, 24, 17)
        .unwrap();
    App::new(now)
}

/// A chat stream that replays a fixed script of chunk results.
pub struct ScriptedStream {
    steps: VecDeque<Result<Option<Bytes>, StreamError>>,
}

impl ScriptedStream {
    /// Text chunks followed by a clean end-of-stream.
    pub fn of_chunks<'a>(chunks: impl IntoIterator<Item = &'a str>) -> Self {
        let steps = chunks
            .into_iter()
            .map(|c| Ok(Some(Bytes::copy_from_slice(c.as_bytes()))))
            .collect();
        Self { steps }
    }

    /// Raw byte chunks (may split multi-byte sequences) followed by
    /// end-of-stream.
    pub fn of_byte_chunks(chunks: Vec<Vec<u8>>) -> Self {
        let steps = chunks.into_iter().map(|c| Ok(Some(Bytes::from(c)))).collect();
        Self { steps }
    }

    /// Text chunks, then a terminal error instead of end-of-stream.
    pub fn failing_after<'a>(
        chunks: impl IntoIterator<Item = &'a str>,
        error: StreamError,
    ) -> Self {
        let mut steps: VecDeque<_> = chunks
            .into_iter()
            .map(|c| Ok(Some(Bytes::copy_from_slice(c.as_bytes()))))
            .collect();
        steps.push_back(Err(error));
        Self { steps }
    }
}

#[async_trait]
impl ChatStream for ScriptedStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        self.steps.pop_front().unwrap_or(Ok(None))
    }
}
