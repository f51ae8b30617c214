use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use stylist_assets::UploadUrls;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FilenameQuery {
    pub filename: Option<String>,
}

impl FilenameQuery {
    fn required(self) -> ApiResult<String> {
        self.filename
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ApiError::validation("`filename` query param is required"))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub download_url: String,
    /// Storage key to keep alongside the image
    pub filename: String,
}

impl From<UploadUrls> for UploadUrlResponse {
    fn from(urls: UploadUrls) -> Self {
        Self {
            upload_url: urls.upload_url,
            download_url: urls.download_url,
            filename: urls.filename,
        }
    }
}

/// Signed PUT and GET URLs for a new, uniquely prefixed object
#[utoipa::path(
    get,
    path = "/assets/upload-url",
    params(
        ("filename" = String, Query, description = "Client file name; prefixed with a unique id")
    ),
    responses(
        (status = 200, description = "Signed URLs", body = UploadUrlResponse),
        (status = 400, description = "Missing filename")
    ),
    tag = "assets"
)]
pub async fn upload_url(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FilenameQuery>, QueryRejection>,
) -> ApiResult<Json<UploadUrlResponse>> {
    let Query(query) = query?;
    let filename = query.required()?;

    let urls = state.assets.issue_upload_url(&filename).await?;
    tracing::debug!(key = %urls.filename, "Issued upload URL");

    Ok(Json(urls.into()))
}

/// Signed GET URL for an existing object, returned as plain text
#[utoipa::path(
    get,
    path = "/assets/download-url",
    params(
        ("filename" = String, Query, description = "Storage key of the object")
    ),
    responses(
        (status = 200, description = "Signed URL", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing filename")
    ),
    tag = "assets"
)]
pub async fn download_url(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FilenameQuery>, QueryRejection>,
) -> ApiResult<String> {
    let Query(query) = query?;
    let filename = query.required()?;

    Ok(state.assets.issue_download_url(&filename).await?)
}
