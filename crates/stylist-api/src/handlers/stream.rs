use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use stylist_llm::completion_handler;
use stylist_persist::{NewMessage, StoredMessage};
use stylist_types::{MessageEntry, MessageRole};

use crate::error::{ApiError, ApiResult};
use crate::routes::sessions::required_user_id;
use crate::state::AppState;

const DEFAULT_RECENT_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    pub user_id: Option<String>,
    pub context_mode: Option<String>,
    pub recent_count: Option<i64>,
}

/// Which part of the history is sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    All,
    /// Only the most recent user message
    Last,
    /// The last N messages
    Recent(usize),
}

impl ContextMode {
    /// Unknown modes fall back to `recent`; counts below one are treated as one
    pub fn from_query(mode: Option<&str>, recent_count: Option<i64>) -> Self {
        match mode {
            Some("all") => ContextMode::All,
            Some("last") => ContextMode::Last,
            _ => {
                let count = recent_count
                    .map(|n| usize::try_from(n.max(1)).unwrap_or(usize::MAX))
                    .unwrap_or(DEFAULT_RECENT_COUNT);
                ContextMode::Recent(count)
            }
        }
    }

    pub fn select(self, messages: &[StoredMessage]) -> Vec<MessageEntry> {
        match self {
            ContextMode::All => messages.iter().map(StoredMessage::to_entry).collect(),
            ContextMode::Last => messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .map(|m| vec![m.to_entry()])
                .unwrap_or_default(),
            ContextMode::Recent(count) => {
                let start = messages.len().saturating_sub(count);
                messages[start..].iter().map(StoredMessage::to_entry).collect()
            }
        }
    }
}

/// Stream the stylist's reply to a session as raw text deltas
///
/// Every completed reply segment is stored as an assistant message. An
/// upstream failure after headers are sent aborts the body instead of
/// ending it cleanly.
#[utoipa::path(
    get,
    path = "/style-analysis/sessions/{sessionId}/stream",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        ("userId" = String, Query, description = "Owner of the session"),
        ("contextMode" = Option<String>, Query, description = "all | recent | last (default: recent)"),
        ("recentCount" = Option<i64>, Query, description = "Messages sent in recent mode (default: 10)")
    ),
    responses(
        (status = 200, description = "Streaming response", content_type = "text/event-stream"),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn stream_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    query: Result<Query<StreamQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let user_id = required_user_id(query.user_id)?;
    let mode = ContextMode::from_query(query.context_mode.as_deref(), query.recent_count);

    // 1. Authorize
    state
        .store
        .get_session(&session_id, &user_id)
        .await?
        .ok_or_else(|| ApiError::session_not_found(&session_id))?;

    // 2. Select context
    let history = state.store.list_all_session_messages(&session_id).await?;
    let context = mode.select(&history);

    // 3. Build provider input (re-signs image URLs)
    let input = state.prompt_builder.prepare_messages(&context).await;

    tracing::info!(
        session_id = %session_id,
        mode = ?mode,
        history = history.len(),
        sent = input.len(),
        "Streaming stylist reply"
    );

    // 4. Persist each completed segment
    let store = state.store.clone();
    let owner_session = session_id.clone();
    let on_complete = completion_handler(move |text: String| {
        let store = store.clone();
        let session_id = owner_session.clone();
        async move {
            if text.trim().is_empty() {
                tracing::debug!(session_id = %session_id, "Skipping empty assistant segment");
                return Ok(());
            }
            let message_id = store
                .add_message(NewMessage::assistant_text(session_id.clone(), text))
                .await?;
            tracing::debug!(session_id = %session_id, message_id = %message_id, "Assistant reply stored");
            Ok(())
        }
    });

    // 5. Open the upstream stream; server shutdown cancels it
    let stream = state
        .llm_client
        .generate_streaming_response(input, Some(on_complete), Some(state.shutdown.child_token()))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
