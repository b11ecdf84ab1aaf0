//! Turns backend response bodies into streams of text fragments.
//!
//! Three framings are supported: a single JSON payload, newline-delimited JSON,
//! and server-sent events. Each decoder takes a `delta` function that pulls the
//! text out of one frame; frames it cannot parse are skipped.

use std::pin::Pin;
use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures::{stream, Stream, StreamExt};
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use crate::error::ChatError;
use crate::services::transport::ByteStream;

/// Reply text in generation order. Lazy, finite, and single-pass.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// What a frame contributed: some text, nothing, or a backend-reported error.
pub type FrameResult = Result<Option<String>, ChatError>;

const DONE_SENTINEL: &str = "[DONE]";

/// Wraps a complete reply as a one-fragment stream.
pub fn single_fragment(text: String) -> FragmentStream {
    Box::pin(stream::once(async move { Ok(text) }))
}

/// Decodes newline-delimited JSON. Lines may arrive split across chunks.
pub fn ndjson_fragments<T, F>(body: ByteStream, delta: F) -> FragmentStream
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> FrameResult + Send + 'static,
{
    Box::pin(ndjson_lines::<T, F>(body, delta))
}

fn ndjson_lines<T, F>(
    mut body: ByteStream,
    delta: F,
) -> impl Stream<Item = Result<String, ChatError>> + Send
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> FrameResult + Send + 'static,
{
    try_stream! {
        let mut pending: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(log_stream_error)?;
            pending.extend_from_slice(&chunk);

            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                if let Some(text) = decode_line::<T, F>(&line, &delta)? {
                    yield text;
                }
            }
        }

        if let Some(text) = decode_line::<T, F>(&pending, &delta)? {
            yield text;
        }
        info!("Newline-delimited stream finished");
    }
}

fn decode_line<T, F>(line: &[u8], delta: &F) -> FrameResult
where
    T: DeserializeOwned,
    F: Fn(T) -> FrameResult,
{
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(_) => {
            debug!("Skipping non UTF-8 stream line");
            return Ok(None);
        }
    };
    if line.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<T>(line) {
        Ok(frame) => non_empty(delta(frame)),
        Err(e) => {
            debug!("Skipping malformed stream line ({}): {}", e, line);
            Ok(None)
        }
    }
}

/// Decodes `data: ...` server-sent events, dropping the `[DONE]` sentinel.
pub fn sse_fragments<T, F>(body: ByteStream, delta: F) -> FragmentStream
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> FrameResult + Send + 'static,
{
    let fragments = body
        .eventsource()
        .map(move |event| -> FrameResult {
            let event = event.map_err(|e| log_stream_error(ChatError::Io(e.to_string())))?;
            let data = event.data.trim();
            if data.is_empty() {
                return Ok(None);
            }
            if data == DONE_SENTINEL {
                info!("Event stream finished with {}", DONE_SENTINEL);
                return Ok(None);
            }
            match serde_json::from_str::<T>(data) {
                Ok(frame) => non_empty(delta(frame)),
                Err(e) => {
                    debug!("Skipping malformed event ({}): {}", e, data);
                    Ok(None)
                }
            }
        })
        .filter_map(|frame| async move {
            match frame {
                Ok(Some(text)) => Some(Ok(text)),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            }
        });
    Box::pin(fragments)
}

fn non_empty(frame: FrameResult) -> FrameResult {
    frame.map(|text| text.filter(|t| !t.is_empty()))
}

fn log_stream_error(e: ChatError) -> ChatError {
    error!("Backend stream failed: {}", e);
    e
}
