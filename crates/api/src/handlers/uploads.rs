//! Raw file uploads for `file` component fields.

use std::path::Path as FsPath;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tripwix_core::component::Upload;
use tripwix_core::slug::slugify;

use crate::error::{AppError, AppResult};
use crate::query::UploadParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Directory under the media root that uploads land in.
const UPLOAD_DIR: &str = "uploads";

/// `"Villa Plan.PDF"` -> `"villa-plan.pdf"`.
fn stored_file_name(original: &str) -> Option<String> {
    let path = FsPath::new(original);
    let stem = slugify(path.file_stem()?.to_str()?);
    if stem.is_empty() {
        return None;
    }
    match path.extension().and_then(|e| e.to_str()).map(slugify) {
        Some(ext) if !ext.is_empty() => Some(format!("{stem}.{ext}")),
        _ => Some(stem),
    }
}

/// POST /api/v1/uploads?file_name=
///
/// Stores the request body under `{MEDIA_ROOT}/uploads/` and returns the
/// storage path to put in a `file` field.
pub async fn upload_file(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Upload body is empty".to_string()));
    }
    let name = stored_file_name(&params.file_name)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid file name: {}", params.file_name)))?;

    let storage_path = format!("{UPLOAD_DIR}/{}-{name}", uuid::Uuid::new_v4());
    let dir = FsPath::new(&state.config.media_root).join(UPLOAD_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;
    tokio::fs::write(FsPath::new(&state.config.media_root).join(&storage_path), &body)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;

    tracing::info!(storage_path = %storage_path, bytes = body.len(), "File uploaded");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: Upload { storage_path },
        }),
    ))
}
