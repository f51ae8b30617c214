// Responses API client implementation

use anyhow::Context;
use async_trait::async_trait;
use futures::Future;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::buffer_utils::parse_sse_stream;
use crate::error::{LLMError, Result};
use crate::streaming::{spawn_text_pipeline, ResponseEventParser};
use crate::traits::{CompletionHandler, LLMClient, TextStream};
use crate::types::{LLMInput, OutputContent, ResponsesResponse};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_STREAM_BUFFER: usize = 64;

/// Endpoint, credentials and model for a [`ResponsesClient`]
#[derive(Debug, Clone)]
pub struct ResponsesConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Deltas buffered between the upstream reader and the consumer
    pub stream_buffer: usize,
}

impl ResponsesConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity;
        self
    }
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a [LLMInput],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

/// Responses API client (HTTP direct, no SDK)
pub struct ResponsesClient {
    http_client: reqwest::Client,
    responses_url: String,
    model: String,
    stream_buffer: usize,
}

impl ResponsesClient {
    pub fn new(config: ResponsesConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            responses_url: format!("{}/responses", config.endpoint.trim_end_matches('/')),
            model: config.model,
            stream_buffer: config.stream_buffer,
        })
    }

    async fn send(&self, input: &[LLMInput], stream: bool) -> Result<reqwest::Response> {
        let payload = ResponsesRequest {
            model: &self.model,
            input,
            stream,
        };

        let response = self
            .http_client
            .post(&self.responses_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Request { status, body });
        }

        Ok(response)
    }
}

/// Race `fut` against the token; dropping `fut` aborts the in-flight request
async fn with_cancellation<T>(
    cancel: Option<&CancellationToken>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(LLMError::Cancelled),
            result = fut => result,
        },
        None => fut.await,
    }
}

#[async_trait]
impl LLMClient for ResponsesClient {
    async fn generate_response(
        &self,
        input: Vec<LLMInput>,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<OutputContent>> {
        let raw = with_cancellation(cancel.as_ref(), async {
            let response = self.send(&input, false).await?;
            let body = response.bytes().await?;
            Ok::<ResponsesResponse, LLMError>(serde_json::from_slice(&body)?)
        })
        .await?;

        tracing::debug!(
            response_id = raw.id.as_deref().unwrap_or_default(),
            status = raw.status.as_deref().unwrap_or_default(),
            "LLM response received"
        );

        Ok(raw.into_message_content())
    }

    async fn generate_streaming_response(
        &self,
        input: Vec<LLMInput>,
        on_complete: Option<CompletionHandler>,
        cancel: Option<CancellationToken>,
    ) -> Result<TextStream> {
        let cancel = cancel.unwrap_or_default();
        if cancel.is_cancelled() {
            return Ok(Box::pin(futures::stream::empty()));
        }

        let response = with_cancellation(Some(&cancel), self.send(&input, true)).await?;

        let events = parse_sse_stream(response.bytes_stream(), ResponseEventParser);
        Ok(spawn_text_pipeline(events, on_complete, cancel, self.stream_buffer))
    }
}
