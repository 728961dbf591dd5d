use serde::{Deserialize, Serialize};

use crate::scoring::{FeedbackResult, ScoreResult};

/// Merged client-facing result. Only ever built from two successful jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub score: u8,
    pub feedback: Vec<String>,
    pub improvement: String,
}

impl AnalysisResponse {
    pub fn merge(score: ScoreResult, feedback: FeedbackResult) -> Self {
        Self {
            score: score.score,
            feedback: feedback.feedback,
            improvement: feedback.suggestion,
        }
    }
}
