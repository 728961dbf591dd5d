use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::scoring::AnalysisFailure;

/// Client-safe message for every downstream failure.
pub const ANALYSIS_FAILED: &str = "Failed to analyze image";

/// Upload rejected before any scoring job runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No image file uploaded")]
    MissingImage,
    #[error("Only JPG and PNG image files are allowed")]
    UnsupportedType,
    #[error("File too large (max {} MiB)", .limit / (1024 * 1024))]
    TooLarge { limit: usize },
    #[error("Malformed upload: {0}")]
    Malformed(String),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidUpload(#[from] UploadError),
    #[error(transparent)]
    Analysis(#[from] AnalysisFailure),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidUpload(e) => (e.status(), e.to_string()),
            ApiError::Analysis(e) => {
                error!(error = %e, stage = %e.source.stage, "analysis failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED.to_string())
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error during analysis");
                (StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
