use std::path::Path;

use axum::async_trait;
use serde::{Deserialize, Serialize};

use super::{FailureCause, ProcessRunner, ScoringFailure, ScoringJob, Stage};

pub const DEFAULT_SUGGESTION: &str = "No specific improvements suggested.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub feedback: Vec<String>,
    pub suggestion: String,
}

#[derive(Debug, Deserialize)]
struct RawFeedback {
    #[serde(default)]
    feedback: Option<Vec<String>>,
    #[serde(default)]
    suggestion: Option<String>,
}

/// Parses `{feedback?: [string], suggestion?: string}`; absent or null fields take defaults.
pub fn parse_feedback(stdout: &str) -> Result<FeedbackResult, String> {
    let raw: RawFeedback = serde_json::from_str(stdout.trim()).map_err(|e| e.to_string())?;
    let suggestion = raw
        .suggestion
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SUGGESTION.to_string());
    Ok(FeedbackResult {
        feedback: raw.feedback.unwrap_or_default(),
        suggestion,
    })
}

pub struct FeedbackJob {
    runner: ProcessRunner,
}

impl FeedbackJob {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ScoringJob for FeedbackJob {
    type Output = FeedbackResult;

    async fn run(&self, image: &Path) -> Result<FeedbackResult, ScoringFailure> {
        let stdout = self.runner.run(image).await?;
        parse_feedback(&stdout)
            .map_err(|e| ScoringFailure::new(Stage::Feedback, FailureCause::Parse(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document() {
        let out = parse_feedback(
            r#"{"feedback":["Good composition"],"suggestion":"Try a wider aperture"}"#,
        )
        .unwrap();
        assert_eq!(out.feedback, vec!["Good composition".to_string()]);
        assert_eq!(out.suggestion, "Try a wider aperture");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let out = parse_feedback("{}\n").unwrap();
        assert!(out.feedback.is_empty());
        assert_eq!(out.suggestion, DEFAULT_SUGGESTION);

        let out = parse_feedback(r#"{"feedback":null,"suggestion":""}"#).unwrap();
        assert!(out.feedback.is_empty());
        assert_eq!(out.suggestion, DEFAULT_SUGGESTION);
    }

    #[test]
    fn rejects_non_documents() {
        assert!(parse_feedback("").is_err());
        assert!(parse_feedback("Good composition").is_err());
        assert!(parse_feedback("[1,2]").is_err());
        assert!(parse_feedback(r#"{"feedback":"not a list"}"#).is_err());
    }
}
