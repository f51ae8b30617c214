use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use stylist_persist::{CreatedSession, NewMessage, NewSession, Session, StoredMessage};
use stylist_types::{MessageEntry, MessageRole, Pagination};

use crate::background::assign_generated_title;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: String,
    pub title: Option<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<MessageEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub title: String,
    pub message_ids: Vec<String>,
}

impl From<CreatedSession> for CreateSessionResponse {
    fn from(created: CreatedSession) -> Self {
        Self {
            session_id: created.session_id,
            title: created.title,
            message_ids: created.message_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedUserQuery {
    pub user_id: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListSessionsResponse {
    #[schema(value_type = Vec<Object>)]
    pub sessions: Vec<Session>,
    #[schema(value_type = Object)]
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessagesResponse {
    pub session_id: String,
    pub session_title: String,
    pub user_id: String,
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<StoredMessage>,
    #[schema(value_type = Object)]
    pub pagination: Pagination,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSessionResponse {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageRequest {
    #[serde(default)]
    pub user_id: String,
    #[schema(value_type = Option<Object>)]
    pub message: Option<MessageEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageResponse {
    pub session_id: String,
    pub message_id: String,
}

/// Create a session together with its opening messages
///
/// When no title is supplied the session starts with the default title and
/// a generated one is stored later in the background.
#[utoipa::path(
    post,
    path = "/style-analysis/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = CreateSessionResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "sessions"
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<Json<CreateSessionResponse>> {
    let Json(req) = payload?;

    if req.messages.is_empty() {
        return Err(ApiError::validation(
            "At least one message is required to create a session",
        ));
    }

    let has_user_message = req
        .messages
        .iter()
        .any(|m| m.role == MessageRole::User && m.has_payload());
    if !has_user_message {
        return Err(ApiError::validation(
            "At least one valid user message with content or image is required to create a session",
        ));
    }

    let title = req.title.filter(|t| !t.trim().is_empty());
    let needs_title = title.is_none();

    let created = state
        .store
        .create_session_with_initial_message(NewSession {
            user_id: req.user_id,
            title,
            messages: req.messages.clone(),
        })
        .await?;

    tracing::info!(
        session_id = %created.session_id,
        messages = created.message_ids.len(),
        "Session created"
    );

    if needs_title {
        state.tasks.spawn(
            "session-title",
            assign_generated_title(
                state.store.clone(),
                state.title_generator.clone(),
                created.session_id.clone(),
                req.messages,
                state.title_options.clone(),
            ),
        );
    }

    Ok(Json(created.into()))
}

/// List a user's sessions, most recently active first
#[utoipa::path(
    get,
    path = "/style-analysis/sessions",
    params(
        ("userId" = String, Query, description = "Owner of the sessions"),
        ("page" = Option<i64>, Query, description = "1-based page number (default: 1)"),
        ("pageSize" = Option<i64>, Query, description = "Items per page (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Page of sessions", body = ListSessionsResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "sessions"
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PagedUserQuery>, QueryRejection>,
) -> ApiResult<Json<ListSessionsResponse>> {
    let Query(query) = query?;
    let user_id = required_user_id(query.user_id)?;
    let (page, page_size) = resolve_page(query.page, query.page_size)?;

    let listing = state.store.get_user_sessions(&user_id, page, page_size).await?;

    let sessions = join_all(listing.items.into_iter().map(|session| refresh_thumbnail(&state, session))).await;

    Ok(Json(ListSessionsResponse {
        sessions,
        pagination: listing.pagination,
    }))
}

/// One page of a session's messages, oldest first
#[utoipa::path(
    get,
    path = "/style-analysis/sessions/{sessionId}/messages",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        ("userId" = String, Query, description = "Owner of the session"),
        ("page" = Option<i64>, Query, description = "1-based page number (default: 1)"),
        ("pageSize" = Option<i64>, Query, description = "Items per page (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Page of messages", body = SessionMessagesResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn get_session_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    query: Result<Query<PagedUserQuery>, QueryRejection>,
) -> ApiResult<Json<SessionMessagesResponse>> {
    let Query(query) = query?;
    let user_id = required_user_id(query.user_id)?;
    let (page, page_size) = resolve_page(query.page, query.page_size)?;

    let session = state
        .store
        .get_session(&session_id, &user_id)
        .await?
        .ok_or_else(|| ApiError::session_not_found(&session_id))?;

    let listing = state
        .store
        .get_session_messages(&session_id, page, page_size)
        .await?;

    let messages = join_all(listing.items.into_iter().map(|message| refresh_message_image(&state, message))).await;

    Ok(Json(SessionMessagesResponse {
        session_id,
        session_title: session.title,
        user_id: session.user_id,
        messages,
        pagination: listing.pagination,
        created_at: session.created_at,
        updated_at: session.updated_at,
    }))
}

/// Soft-delete a session
#[utoipa::path(
    delete,
    path = "/style-analysis/sessions/{sessionId}",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        ("userId" = String, Query, description = "Owner of the session")
    ),
    responses(
        (status = 200, description = "Session deleted", body = DeleteSessionResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<DeleteSessionResponse>> {
    let Query(query) = query?;
    let user_id = required_user_id(query.user_id)?;

    state
        .store
        .get_session(&session_id, &user_id)
        .await?
        .ok_or_else(|| ApiError::session_not_found(&session_id))?;

    // A concurrent delete between the check and here still surfaces as 404
    state.store.soft_delete_session(&session_id, &user_id).await?;

    tracing::info!(session_id = %session_id, "Session soft-deleted");

    Ok(Json(DeleteSessionResponse {
        message: "Session deleted successfully".to_string(),
        session_id,
    }))
}

/// Append one message to an existing session
#[utoipa::path(
    post,
    path = "/style-analysis/sessions/{sessionId}/messages",
    params(
        ("sessionId" = String, Path, description = "Session ID")
    ),
    request_body = AddMessageRequest,
    responses(
        (status = 200, description = "Message added", body = AddMessageResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn add_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    payload: Result<Json<AddMessageRequest>, JsonRejection>,
) -> ApiResult<Json<AddMessageResponse>> {
    let Json(req) = payload?;

    let message = req
        .message
        .ok_or_else(|| ApiError::validation("A message is required to add to the session"))?;
    if !message.has_payload() {
        return Err(ApiError::validation(
            "The message must contain either text content or an image",
        ));
    }

    state
        .store
        .get_session(&session_id, &req.user_id)
        .await?
        .ok_or_else(|| ApiError::session_not_found(&session_id))?;

    let message_id = state
        .store
        .add_message(NewMessage::new(session_id.clone(), message))
        .await?;

    Ok(Json(AddMessageResponse {
        session_id,
        message_id,
    }))
}

pub(crate) fn required_user_id(user_id: Option<String>) -> ApiResult<String> {
    user_id
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::validation("userId query parameter is required"))
}

/// Defaults to page 1 of 20 and caps the page size
fn resolve_page(page: Option<i64>, page_size: Option<i64>) -> ApiResult<(u32, u32)> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE));

    if page < 1 || page_size < 1 {
        return Err(ApiError::validation("page and pageSize must be at least 1"));
    }

    let page = u32::try_from(page).unwrap_or(u32::MAX);
    let page_size = u32::try_from(page_size.min(i64::from(MAX_PAGE_SIZE))).unwrap_or(MAX_PAGE_SIZE);

    Ok((page, page_size))
}

async fn refresh_thumbnail(state: &AppState, mut session: Session) -> Session {
    if let Some(url) = session.thumbnail_image_url.as_deref() {
        session.thumbnail_image_url = Some(state.assets.refresh_url(url).await);
    }
    session
}

async fn refresh_message_image(state: &AppState, mut message: StoredMessage) -> StoredMessage {
    if let Some(image) = message.remote_image.as_mut() {
        image.url = state.assets.refresh_url(&image.url).await;
    }
    message
}
