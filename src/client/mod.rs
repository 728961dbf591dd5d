//! Client-side session: the current image, its analysis, and durable rehydration.

mod api;
mod durable;
mod image;
mod store;

pub use api::{AnalyzeApi, ClientError, HttpAnalyzeApi};
pub use durable::{DurableStorage, FileStorage, MemoryStorage};
pub use image::{ImageFile, ImageRef};
pub use store::{ClientSession, Screen, SessionStore, ORIGINAL_IMAGE_KEY};
