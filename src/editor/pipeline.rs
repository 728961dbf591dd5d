use image::{codecs::jpeg::JpegEncoder, imageops, RgbImage};
use thiserror::Error;

use super::params::EditParams;
use crate::{client::ImageFile, uploads::ImageMime};

pub const EDITED_IMAGE_NAME: &str = "edited-image.jpg";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no original image to edit")]
    NoSource,
    #[error("decode source image: {0}")]
    Decode(String),
    #[error("encode rendered image: {0}")]
    Encode(String),
    #[error("render task failed: {0}")]
    Task(String),
}

/// Renders `source` through brightness, contrast, saturate and blur, in that
/// order, and encodes the result as JPEG.
///
/// Identity parameters hand back the source untouched.
pub fn render(source: &ImageFile, params: EditParams, quality: u8) -> Result<ImageFile, RenderError> {
    let params = params.clamped();
    if params.is_identity() {
        return Ok(source.clone());
    }

    let decoded = image::load_from_memory(&source.bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
    let mut rgb = decoded.to_rgb8();
    apply_color(&mut rgb, params);

    let out = if params.blur > 0.0 {
        imageops::blur(&rgb, params.blur)
    } else {
        rgb
    };

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode_image(&out)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok(ImageFile::new(EDITED_IMAGE_NAME, ImageMime::Jpeg, buf))
}

fn apply_color(img: &mut RgbImage, params: EditParams) {
    let brightness = 1.0 + params.brightness;
    let contrast = 1.0 + params.contrast;
    let m = saturate_matrix(1.0 + params.saturation);

    for px in img.pixels_mut() {
        let mut v = px.0.map(|c| c as f32 / 255.0);
        for c in v.iter_mut() {
            *c = (*c * brightness).clamp(0.0, 1.0);
            *c = ((*c - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
        }
        let [r, g, b] = v;
        let saturated = m.map(|row| (row[0] * r + row[1] * g + row[2] * b).clamp(0.0, 1.0));
        px.0 = saturated.map(|c| (c * 255.0).round() as u8);
    }
}

/// Luminance-preserving saturation matrix (the one CSS `saturate()` uses).
fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}
