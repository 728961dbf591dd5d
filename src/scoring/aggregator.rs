use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{
    AestheticJob, AnalysisFailure, FeedbackJob, FeedbackResult, ProcessRunner, ScoreResult,
    ScoringJob, Stage,
};
use crate::{analysis::AnalysisResponse, config::ScoringConfig, uploads::UploadedImage};

pub type DynJob<T> = Arc<dyn ScoringJob<Output = T>>;

/// Runs both scoring jobs for one staged image and merges their results.
///
/// Both jobs always run to completion. Success requires both to succeed.
#[derive(Clone)]
pub struct Aggregator {
    aesthetic: DynJob<ScoreResult>,
    feedback: DynJob<FeedbackResult>,
}

impl Aggregator {
    pub fn new(aesthetic: DynJob<ScoreResult>, feedback: DynJob<FeedbackResult>) -> Self {
        Self {
            aesthetic,
            feedback,
        }
    }

    pub fn from_config(cfg: &ScoringConfig) -> Self {
        let aesthetic = ProcessRunner::new(Stage::Aesthetic, cfg.aesthetic.clone(), cfg.timeout);
        let feedback = ProcessRunner::new(Stage::Feedback, cfg.feedback.clone(), cfg.timeout);
        Self::new(
            Arc::new(AestheticJob::new(aesthetic)),
            Arc::new(FeedbackJob::new(feedback)),
        )
    }

    #[instrument(skip(self, image), fields(path = %image.storage_path.display()))]
    pub async fn analyze(&self, image: &UploadedImage) -> Result<AnalysisResponse, AnalysisFailure> {
        let path = image.storage_path.as_path();
        let (score, feedback) = tokio::join!(self.aesthetic.run(path), self.feedback.run(path));

        match (score, feedback) {
            (Ok(score), Ok(feedback)) => {
                info!(score = score.score, notes = feedback.feedback.len(), "analysis complete");
                Ok(AnalysisResponse::merge(score, feedback))
            }
            (Err(first), other) => {
                if let Err(second) = other {
                    warn!(error = %second, "feedback job also failed");
                }
                Err(first.into())
            }
            (Ok(_), Err(e)) => Err(e.into()),
        }
    }
}
