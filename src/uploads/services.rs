use anyhow::Context;
use rand::Rng;
use time::OffsetDateTime;

use super::dto::{ImageMime, UploadItem, UploadedImage};
use crate::{error::UploadError, storage::StagingStore};

pub fn validate(item: &UploadItem, max_bytes: usize) -> Result<ImageMime, UploadError> {
    let mime = ImageMime::from_content_type(&item.content_type).ok_or(UploadError::UnsupportedType)?;
    if item.body.len() > max_bytes {
        return Err(UploadError::TooLarge { limit: max_bytes });
    }
    Ok(mime)
}

/// `<unix-millis>-<random>.<ext>`; the extension comes from the client file name when it is sane.
pub fn staged_name(file_name: Option<&str>, mime: ImageMime, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = file_name
        .and_then(|n| std::path::Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| mime.extension().to_string());
    format!("{millis}-{suffix}.{ext}")
}

pub async fn stage_upload(
    staging: &dyn StagingStore,
    item: UploadItem,
    mime: ImageMime,
) -> anyhow::Result<UploadedImage> {
    let created_at = OffsetDateTime::now_utc();
    let name = staged_name(item.file_name.as_deref(), mime, created_at);
    let size_bytes = item.body.len() as u64;
    let storage_path = staging
        .put_object(&name, item.body)
        .await
        .with_context(|| format!("stage upload {}", name))?;

    Ok(UploadedImage {
        storage_path,
        mime_type: mime,
        size_bytes,
        created_at,
    })
}
