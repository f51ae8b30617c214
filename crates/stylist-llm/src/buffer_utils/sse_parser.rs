use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;

use super::buffering::CircularLineBuffer;
use crate::error::LLMError;

/// Strategy pattern for parsing different SSE payload types
pub trait SseLineParser: Send {
    type Record: Send + 'static;

    /// Parse the payload of one `data: ` line
    fn parse_data_line(&self, data: &str) -> Result<Self::Record, serde_json::Error>;

    /// Check if this payload is the end-of-stream marker
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// One decoded SSE data line
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent<R> {
    Record(R),
    /// Line that could not be decoded; the stream carries on after it
    Malformed { line: String, reason: String },
}

/// Generic SSE stream parser using circular buffer.
///
/// Only `data: ` lines are inspected. The done marker is a no-op, not a
/// terminator: the stream ends when the upstream byte stream ends. Decode
/// failures come out as [`SseEvent::Malformed`]; only transport failures are
/// `Err`.
pub fn parse_sse_stream<S, E, P>(
    byte_stream: S,
    parser: P,
) -> Pin<Box<dyn Stream<Item = Result<SseEvent<P::Record>, LLMError>> + Send>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(&bytes);

                    // Process all complete lines in buffer
                    while let Some(line_result) = buffer.next_line() {
                        if let Some(event) = decode_line(&parser, line_result) {
                            yield Ok(event);
                        }
                    }
                }
                Err(e) => {
                    yield Err(LLMError::Stream(e.to_string()));
                    return;
                }
            }
        }

        if let Some(line_result) = buffer.take_remainder() {
            if let Some(event) = decode_line(&parser, line_result) {
                yield Ok(event);
            }
        }
    })
}

fn decode_line<P: SseLineParser>(
    parser: &P,
    line_result: Result<String, std::str::Utf8Error>,
) -> Option<SseEvent<P::Record>> {
    let line = match line_result {
        Ok(line) => line,
        Err(e) => {
            return Some(SseEvent::Malformed {
                line: String::new(),
                reason: format!("invalid UTF-8: {}", e),
            })
        }
    };

    let data = line.strip_prefix("data: ")?;
    if parser.is_done_marker(data) {
        return None;
    }

    Some(match parser.parse_data_line(data) {
        Ok(record) => SseEvent::Record(record),
        Err(e) => SseEvent::Malformed {
            reason: e.to_string(),
            line,
        },
    })
}
