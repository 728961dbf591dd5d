use std::path::Path;

use axum::async_trait;
use serde::{Deserialize, Serialize};

use super::{FailureCause, ProcessRunner, ScoringFailure, ScoringJob, Stage};

pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
}

/// Parses the aesthetic scorer's stdout.
///
/// Accepts a bare integer, or a decimal truncated toward zero (the scorer
/// model prints raw floats such as `6.83`). Surrounding whitespace is ignored.
///
/// Values are not clamped. A result outside `0..=10` after truncation (`11.2`,
/// `-1`) is a parse failure, which the request reports as the generic
/// analysis error.
pub fn parse_score(stdout: &str) -> Result<ScoreResult, String> {
    let raw = stdout.trim();
    if raw.is_empty() {
        return Err("empty output".into());
    }

    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = raw
                .parse::<f64>()
                .map_err(|_| format!("not a number: {raw:?}"))?;
            if !f.is_finite() {
                return Err(format!("not a finite number: {raw:?}"));
            }
            f.trunc() as i64
        }
    };

    u8::try_from(value)
        .ok()
        .filter(|s| *s <= MAX_SCORE)
        .map(|score| ScoreResult { score })
        .ok_or_else(|| format!("score {value} outside 0..={MAX_SCORE}"))
}

pub struct AestheticJob {
    runner: ProcessRunner,
}

impl AestheticJob {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ScoringJob for AestheticJob {
    type Output = ScoreResult;

    async fn run(&self, image: &Path) -> Result<ScoreResult, ScoringFailure> {
        let stdout = self.runner.run(image).await?;
        parse_score(&stdout)
            .map_err(|e| ScoringFailure::new(Stage::Aesthetic, FailureCause::Parse(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_with_trailing_newline() {
        assert_eq!(parse_score("7\n").unwrap().score, 7);
        assert_eq!(parse_score("  0 ").unwrap().score, 0);
        assert_eq!(parse_score("10").unwrap().score, 10);
    }

    #[test]
    fn decimal_is_truncated() {
        assert_eq!(parse_score("6.83\n").unwrap().score, 6);
        assert_eq!(parse_score("9.999").unwrap().score, 9);
    }

    #[test]
    fn rejects_garbage_and_out_of_range() {
        assert!(parse_score("").is_err());
        assert!(parse_score("seven").is_err());
        assert!(parse_score("NaN").is_err());
        assert!(parse_score("11").is_err());
        assert!(parse_score("11.2").is_err());
        assert_eq!(parse_score("10.7").unwrap().score, 10);
        assert_eq!(parse_score("-0.5").unwrap().score, 0);
        assert!(parse_score("-1").is_err());
        assert!(parse_score("7\n8").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn job_reports_parse_failures_under_its_stage() {
        use crate::config::ScorerCommand;

        let runner = ProcessRunner::new(
            Stage::Aesthetic,
            ScorerCommand::new("sh", &["-c", "echo oops", "scorer"]),
            None,
        );
        let err = AestheticJob::new(runner).run(Path::new("x.jpg")).await.unwrap_err();
        assert_eq!(err.stage, Stage::Aesthetic);
        assert!(matches!(err.cause, FailureCause::Parse(_)));
    }
}
