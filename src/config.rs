use std::{path::PathBuf, time::Duration};

use anyhow::Context;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// What happens to a staged upload once its response has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    Delete,
    Retain,
}

impl RetentionPolicy {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "retain" | "keep" => Ok(Self::Retain),
            other => anyhow::bail!("unknown UPLOAD_RETENTION value: {other}"),
        }
    }
}

/// External scorer command line. The staged file path is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ScorerCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().context("empty scorer command")?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub aesthetic: ScorerCommand,
    pub feedback: ScorerCommand,
    /// `None` means a scorer may run forever.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub retention: RetentionPolicy,
    pub cors_origin: Option<String>,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let scoring = ScoringConfig {
            aesthetic: ScorerCommand::parse(
                &std::env::var("AESTHETIC_SCORER")
                    .unwrap_or_else(|_| "python models/aesthetic_score.py".into()),
            )
            .context("AESTHETIC_SCORER")?,
            feedback: ScorerCommand::parse(
                &std::env::var("FEEDBACK_SCORER")
                    .unwrap_or_else(|_| "python models/clip_analysis.py".into()),
            )
            .context("FEEDBACK_SCORER")?,
            timeout: timeout_from_secs(
                std::env::var("SCORING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(120),
            ),
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(5000),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            retention: match std::env::var("UPLOAD_RETENTION") {
                Ok(raw) => RetentionPolicy::parse(&raw)?,
                Err(_) => RetentionPolicy::Delete,
            },
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            scoring,
        })
    }

    /// Config for tests and embedding: stage under `upload_dir`, given scorers, no timeout.
    pub fn local(upload_dir: impl Into<PathBuf>, aesthetic: ScorerCommand, feedback: ScorerCommand) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            upload_dir: upload_dir.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            retention: RetentionPolicy::Delete,
            cors_origin: None,
            scoring: ScoringConfig {
                aesthetic,
                feedback,
                timeout: None,
            },
        }
    }
}

/// Where the client store sends uploads.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api".into(),
        }
    }
}

impl ClientConfig {
    pub fn analyze_url(&self) -> String {
        format!("{}/analyze", self.api_base.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Quiet period after the last adjustment before a preview render starts.
    pub debounce: Duration,
    pub jpeg_quality: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            jpeg_quality: 92,
        }
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
