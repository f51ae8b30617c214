use axum::Json;
use utoipa::OpenApi;

use crate::handlers::stream;
use crate::routes::{assets, health, sessions};

#[derive(OpenApi)]
#[openapi(
    info(title = "Style Analysis API"),
    paths(
        health::root,
        health::health_check,
        sessions::create_session,
        sessions::list_sessions,
        sessions::get_session_messages,
        sessions::delete_session,
        sessions::add_message,
        stream::stream_session,
        assets::upload_url,
        assets::download_url,
    ),
    components(schemas(
        health::HealthResponse,
        sessions::CreateSessionRequest,
        sessions::CreateSessionResponse,
        sessions::ListSessionsResponse,
        sessions::SessionMessagesResponse,
        sessions::DeleteSessionResponse,
        sessions::AddMessageRequest,
        sessions::AddMessageResponse,
        assets::UploadUrlResponse,
    )),
    tags(
        (name = "health", description = "Liveness and dependency status"),
        (name = "sessions", description = "Style analysis sessions and streamed replies"),
        (name = "assets", description = "Signed object storage URLs")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
