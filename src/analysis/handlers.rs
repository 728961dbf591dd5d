use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::BytesMut;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::AnalysisResponse;
use crate::{
    config::RetentionPolicy,
    error::{ApiError, UploadError},
    state::AppState,
    uploads::{self, UploadItem, UploadedImage},
};

pub const IMAGE_FIELD: &str = "image";

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn analyze_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

/// POST /api/analyze (multipart, field `image`)
#[instrument(skip(state, mp), fields(request_id = %Uuid::new_v4()))]
pub async fn analyze(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let mut mp = mp.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "request is not multipart");
        UploadError::MissingImage
    })?;
    let limit = state.config.max_upload_bytes;
    let item = read_image_field(&mut mp, limit).await?;
    let mime = uploads::validate(&item, limit)?;

    let staged = uploads::stage_upload(state.staging.as_ref(), item, mime).await?;
    info!(path = %staged.storage_path.display(), bytes = staged.size_bytes, "upload staged");

    let result = state.aggregator.analyze(&staged).await;
    release(&state, &staged).await;

    Ok(Json(result?))
}

async fn read_image_field(mp: &mut Multipart, limit: usize) -> Result<UploadItem, UploadError> {
    while let Some(mut field) = mp.next_field().await.map_err(|e| multipart_error(e, limit))? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if uploads::ImageMime::from_content_type(&content_type).is_none() {
            warn!(%content_type, "rejected upload type");
            return Err(UploadError::UnsupportedType);
        }
        let file_name = field.file_name().map(str::to_string);

        let mut body = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            if body.len() + chunk.len() > limit {
                warn!(limit, "rejected oversized upload");
                return Err(UploadError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        return Ok(UploadItem {
            body: body.freeze(),
            content_type,
            file_name,
        });
    }
    Err(UploadError::MissingImage)
}

fn multipart_error(e: MultipartError, limit: usize) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit }
    } else {
        UploadError::Malformed(e.body_text())
    }
}

async fn release(state: &AppState, staged: &UploadedImage) {
    if state.config.retention == RetentionPolicy::Retain {
        return;
    }
    if let Err(e) = state.staging.delete_object(&staged.storage_path).await {
        warn!(error = %e, "failed to remove staged upload");
    }
}
