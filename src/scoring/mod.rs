//! Scoring jobs: external scorer processes behind a uniform async interface.

use std::{fmt, path::Path, time::Duration};

use axum::async_trait;
use thiserror::Error;

mod aesthetic;
mod aggregator;
mod feedback;
mod runner;

pub use aesthetic::{parse_score, AestheticJob, ScoreResult};
pub use aggregator::Aggregator;
pub use feedback::{parse_feedback, FeedbackJob, FeedbackResult, DEFAULT_SUGGESTION};
pub use runner::ProcessRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Aesthetic,
    Feedback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Aesthetic => f.write_str("aesthetic"),
            Stage::Feedback => f.write_str("feedback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    #[error("failed to launch scorer: {0}")]
    Spawn(String),
    #[error("scorer i/o failed: {0}")]
    Io(String),
    #[error("scorer exited with {}", .0.map(|c| format!("code {c}")).unwrap_or_else(|| "a signal".into()))]
    ExitStatus(Option<i32>),
    #[error("unparseable scorer output: {0}")]
    Parse(String),
    #[error("scorer timed out after {0:?}")]
    Timeout(Duration),
}

/// One job's failure. Logged server-side, never sent to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} scoring failed: {cause}")]
pub struct ScoringFailure {
    pub stage: Stage,
    pub cause: FailureCause,
}

impl ScoringFailure {
    pub fn new(stage: Stage, cause: FailureCause) -> Self {
        Self { stage, cause }
    }
}

/// Aggregate failure: at least one job failed, so there is no result at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("analysis failed: {source}")]
pub struct AnalysisFailure {
    #[from]
    pub source: ScoringFailure,
}

#[async_trait]
pub trait ScoringJob: Send + Sync {
    type Output: Send;

    async fn run(&self, image: &Path) -> Result<Self::Output, ScoringFailure>;
}
