use serde::{Deserialize, Serialize};

pub const MAX_BLUR: f32 = 10.0;

/// Adjustments applied on top of the original image. Never written back into it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EditParams {
    /// -1.0 (black) ..= 1.0 (twice as bright); 0.0 = unchanged
    pub brightness: f32,
    /// -1.0 (flat grey) ..= 1.0 (double contrast); 0.0 = unchanged
    pub contrast: f32,
    /// -1.0 (greyscale) ..= 1.0 (double saturation); 0.0 = unchanged
    pub saturation: f32,
    /// Gaussian blur radius in pixels, 0.0 ..= 10.0
    pub blur: f32,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            blur: 0.0,
        }
    }
}

impl EditParams {
    pub fn new(brightness: f32, contrast: f32, saturation: f32, blur: f32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            blur,
        }
    }

    /// Pulls every value into its slider range; NaN counts as "no adjustment".
    pub fn clamped(self) -> Self {
        fn unit(v: f32) -> f32 {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(-1.0, 1.0)
            }
        }
        Self {
            brightness: unit(self.brightness),
            contrast: unit(self.contrast),
            saturation: unit(self.saturation),
            blur: if self.blur.is_nan() {
                0.0
            } else {
                self.blur.clamp(0.0, MAX_BLUR)
            },
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
