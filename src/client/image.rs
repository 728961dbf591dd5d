use std::path::Path;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::uploads::ImageMime;

/// An in-memory image file, the unit handed to `analyze`/`reanalyze`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: ImageMime,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: ImageMime, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes: bytes.into(),
        }
    }

    /// Reads a `.jpg`/`.jpeg`/`.png` file from disk.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let mime = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jpg" | "jpeg") => ImageMime::Jpeg,
            Some("png") => ImageMime::Png,
            _ => anyhow::bail!("unsupported image extension: {}", path.display()),
        };
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read image {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image.{}", mime.extension()));
        Ok(Self::new(name, mime, bytes))
    }

    pub fn to_ref(&self) -> ImageRef {
        ImageRef(format!("data:{};base64,{}", self.mime.as_str(), STANDARD.encode(&self.bytes)))
    }
}

/// Self-contained image reference (a `data:` URI) that survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_file(&self) -> anyhow::Result<ImageFile> {
        let rest = self.0.strip_prefix("data:").context("not a data URI")?;
        let (mime, payload) = rest.split_once(";base64,").context("data URI is not base64")?;
        let mime = ImageMime::from_content_type(mime)
            .with_context(|| format!("unsupported data URI type {mime}"))?;
        let bytes = STANDARD.decode(payload).context("decode data URI payload")?;
        Ok(ImageFile::new(format!("original.{}", mime.extension()), mime, bytes))
    }
}
