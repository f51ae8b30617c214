use crate::error::Result;
use crate::types::{LLMInput, OutputContent};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Live text stream handed back to the HTTP layer.
///
/// Each item is one delta, forwarded as soon as the provider sends it.
/// An `Err` item means the stream was aborted and must not be treated as a
/// clean end of output.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Callback invoked with the full text of each completed output segment
pub type CompletionHandler =
    Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`CompletionHandler`]
pub fn completion_handler<F, Fut>(f: F) -> CompletionHandler
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |text| Box::pin(f(text)))
}

/// Client for a hosted Responses-style LLM endpoint.
///
/// Stateless per call: every method takes its whole input and owns no
/// conversation state.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// One non-streaming request; returns the flattened content of every
    /// `message` output item in order.
    async fn generate_response(
        &self,
        input: Vec<LLMInput>,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<OutputContent>>;

    /// One streaming request.
    ///
    /// Fails before producing any bytes when the provider rejects the
    /// request. When `cancel` is already cancelled, an empty, closed stream is
    /// returned without contacting the provider.
    async fn generate_streaming_response(
        &self,
        input: Vec<LLMInput>,
        on_complete: Option<CompletionHandler>,
        cancel: Option<CancellationToken>,
    ) -> Result<TextStream>;
}
