use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use tracing::debug;

#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Writes `body` under `name` and returns the path scorers should read.
    async fn put_object(&self, name: &str, body: Bytes) -> anyhow::Result<PathBuf>;
    async fn delete_object(&self, path: &Path) -> anyhow::Result<()>;
}

/// Stages uploads in a local directory, created on first write.
#[derive(Clone, Debug)]
pub struct LocalStaging {
    dir: PathBuf,
}

impl LocalStaging {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl StagingStore for LocalStaging {
    async fn put_object(&self, name: &str, body: Bytes) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create staging dir {}", self.dir.display()))?;

        let path = self.dir.join(name);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write staged file {}", path.display()))?;
        debug!(path = %path.display(), bytes = body.len(), "staged upload");
        Ok(path)
    }

    async fn delete_object(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("remove staged file {}", path.display()))?;
        Ok(())
    }
}
