mod dto;
mod services;

pub use dto::{ImageMime, UploadItem, UploadedImage};
pub use services::{stage_upload, staged_name, validate};
