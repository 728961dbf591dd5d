mod dto;
pub mod handlers;

use axum::Router;

use crate::state::AppState;

pub use dto::AnalysisResponse;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    handlers::analyze_routes(max_upload_bytes)
}
