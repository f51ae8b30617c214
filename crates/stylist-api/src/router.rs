use axum::{
    http::{Method, StatusCode},
    middleware,
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::handlers::stream;
use crate::middleware::logging;
use crate::openapi;
use crate::routes::{assets, health, sessions};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        // Sessions
        .route(
            "/style-analysis/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/style-analysis/sessions/:session_id",
            delete(sessions::delete_session),
        )
        .route(
            "/style-analysis/sessions/:session_id/messages",
            get(sessions::get_session_messages).post(sessions::add_message),
        )
        .route(
            "/style-analysis/sessions/:session_id/stream",
            get(stream::stream_session),
        )
        // Assets
        .route("/assets/upload-url", get(assets::upload_url))
        .route("/assets/download-url", get(assets::download_url));

    // Compression's default predicate leaves text/event-stream alone
    api_routes
        .fallback(not_found)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .cors
            .origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        cors.allow_origin(origins)
    }
}
