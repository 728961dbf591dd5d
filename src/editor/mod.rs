//! Non-destructive image adjustments with a debounced live preview.

mod params;
mod pipeline;
mod preview;

use thiserror::Error;

use crate::client::ClientError;

pub use params::{EditParams, MAX_BLUR};
pub use pipeline::{render, RenderError, EDITED_IMAGE_NAME};
pub use preview::{Preview, PreviewRenderer};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Client(#[from] ClientError),
}
