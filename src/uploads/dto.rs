use std::path::PathBuf;

use bytes::Bytes;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    /// Accepts `image/jpeg`, its `image/jpg` alias and `image/png`; parameters are ignored.
    pub fn from_content_type(ct: &str) -> Option<Self> {
        let essence = ct.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// One multipart file part as received.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// A validated upload persisted to the staging area. Owned by a single request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub storage_path: PathBuf,
    pub mime_type: ImageMime,
    pub size_bytes: u64,
    pub created_at: OffsetDateTime,
}
