use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::buffer_utils::{SseEvent, SseLineParser};
use crate::error::{LLMError, Result};
use crate::traits::{CompletionHandler, TextStream};

/// One decoded record of a streaming `/responses` call.
///
/// Only the text delta/done pair drives the pipeline; every other `type`
/// is accepted and ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseStreamRecord {
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        #[serde(default)]
        delta: String,
    },

    #[serde(rename = "response.output_text.done")]
    OutputTextDone {
        #[serde(default)]
        text: Option<String>,
    },

    #[serde(other)]
    Other,
}

/// SSE strategy for Responses API event payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEventParser;

impl SseLineParser for ResponseEventParser {
    type Record = ResponseStreamRecord;

    fn parse_data_line(&self, data: &str) -> std::result::Result<Self::Record, serde_json::Error> {
        serde_json::from_str(data)
    }
}

/// Run the delta pipeline on a background task and return the client-facing stream.
///
/// Deltas are forwarded one by one as they arrive and also accumulated; each
/// `response.output_text.done` hands the accumulated segment to `on_complete`
/// and starts a new one. If the consumer goes away the task keeps draining
/// upstream so completed segments still reach `on_complete`. Cancelling
/// `cancel` drops the upstream read, even while a send to a stalled consumer
/// is pending, and ends the outgoing stream with [`LLMError::Aborted`].
pub fn spawn_text_pipeline<S>(
    records: S,
    on_complete: Option<CompletionHandler>,
    cancel: CancellationToken,
    capacity: usize,
) -> TextStream
where
    S: Stream<Item = Result<SseEvent<ResponseStreamRecord>>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(run_pipeline(records, on_complete, cancel, tx));

    Box::pin(ReceiverStream::new(rx))
}

async fn run_pipeline<S>(
    records: S,
    on_complete: Option<CompletionHandler>,
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<Bytes>>,
) where
    S: Stream<Item = Result<SseEvent<ResponseStreamRecord>>> + Send + 'static,
{
    let mut records = Box::pin(records);
    let mut segment = String::new();
    let mut streamed_chars = 0usize;
    let mut client_open = true;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            next = records.next() => Some(next),
        };

        let Some(next) = next else {
            drop(records);
            abort_outgoing(&tx, streamed_chars);
            return;
        };
        let Some(item) = next else { break };

        match item {
            Ok(SseEvent::Record(ResponseStreamRecord::OutputTextDelta { delta })) => {
                if delta.is_empty() {
                    continue;
                }
                segment.push_str(&delta);
                streamed_chars += delta.chars().count();

                if !client_open {
                    continue;
                }
                match forward(&tx, Ok(Bytes::from(delta)), &cancel).await {
                    Forward::Sent => {}
                    Forward::Closed => {
                        tracing::debug!("Stream consumer dropped; draining upstream");
                        client_open = false;
                    }
                    Forward::Cancelled => {
                        drop(records);
                        abort_outgoing(&tx, streamed_chars);
                        return;
                    }
                }
            }
            Ok(SseEvent::Record(ResponseStreamRecord::OutputTextDone { .. })) => {
                let completed = std::mem::take(&mut segment);
                tracing::debug!(chars = completed.chars().count(), "Output segment completed");

                if let Some(handler) = &on_complete {
                    invoke_completion(handler, completed).await;
                }
            }
            Ok(SseEvent::Record(ResponseStreamRecord::Other)) => {}
            Ok(SseEvent::Malformed { line, reason }) => {
                tracing::warn!(line = %line, error = %reason, "Skipping malformed SSE line");
            }
            Err(e) => {
                tracing::error!(error = %e, streamed_chars, "Upstream stream failed");
                drop(records);
                if let Forward::Cancelled = forward(&tx, Err(e), &cancel).await {
                    abort_outgoing(&tx, streamed_chars);
                }
                return;
            }
        }
    }

    tracing::info!(streamed_chars, "Streamed response finished");
}

enum Forward {
    Sent,
    Closed,
    Cancelled,
}

/// Sends one item unless `cancel` fires first, so a stalled consumer never
/// pins the task
async fn forward(
    tx: &mpsc::Sender<Result<Bytes>>,
    item: Result<Bytes>,
    cancel: &CancellationToken,
) -> Forward {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Forward::Cancelled,
        sent = tx.send(item) => match sent {
            Ok(()) => Forward::Sent,
            Err(_) => Forward::Closed,
        },
    }
}

/// Best-effort abort marker; with a full channel the stream just ends after
/// what is already buffered
fn abort_outgoing(tx: &mpsc::Sender<Result<Bytes>>, streamed_chars: usize) {
    tracing::debug!(streamed_chars, "Streaming response cancelled");
    if tx.try_send(Err(LLMError::Aborted)).is_err() {
        tracing::debug!("Outgoing stream full or closed; abort marker dropped");
    }
}

/// Runs the handler on its own task so an error or panic stays contained
async fn invoke_completion(handler: &CompletionHandler, text: String) {
    match tokio::spawn(handler(text)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Completion handler failed"),
        Err(e) => tracing::error!(error = %e, "Completion handler panicked"),
    }
}
