use image::{Rgb, RgbImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    CHANNEL_MAX, CHANNEL_SCALE, DEFAULT_BRIGHTNESS, DEFAULT_CONTRAST, SATURATION_BASE,
};

/// Parameters of the diverging red/blue color scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorMapParams {
    /// Multiplier applied to |v| before the saturation curve.
    pub brightness: f64,
    /// Exponent applied to the scaled magnitude.
    pub contrast: f64,
}

impl Default for ColorMapParams {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            contrast: DEFAULT_CONTRAST,
        }
    }
}

/// Map a non-negative magnitude to a channel intensity.
///
/// intensity = min(256 * (1 - 0.5^((m * brightness)^contrast)), 255), truncated.
///
/// Out-of-domain parameters never panic: a negative level clamps to 0 and
/// NaN survives `clamp` only to become 0 in the saturating cast.
pub fn channel_intensity(magnitude: f64, params: &ColorMapParams) -> u8 {
    let scaled = (magnitude * params.brightness).powf(params.contrast);
    let level = CHANNEL_SCALE * (1.0 - SATURATION_BASE.powf(scaled));
    level.clamp(0.0, CHANNEL_MAX) as u8
}

/// Map a single sample: positive values drive red, negative values drive blue.
///
/// `f64::max` discards NaN, so a NaN sample maps as if it were zero.
pub fn map_pixel(value: f64, params: &ColorMapParams) -> Rgb<u8> {
    let red = channel_intensity(value.max(0.0), params);
    let blue = channel_intensity((-value).max(0.0), params);
    Rgb([red, 0, blue])
}

/// Render a 2D array as a false-color RGB image.
///
/// Image row `r` shows array row `H - 1 - r`, so the first array row ends up
/// at the bottom of the picture.
pub fn array_to_image(data: &Array2<f64>, params: &ColorMapParams) -> RgbImage {
    let h = data.nrows();
    let w = data.ncols();

    let mut img = RgbImage::new(w as u32, h as u32);
    for row in 0..h {
        let y = (h - 1 - row) as u32;
        for col in 0..w {
            img.put_pixel(col as u32, y, map_pixel(data[[row, col]], params));
        }
    }

    tracing::debug!(
        width = w,
        height = h,
        brightness = params.brightness,
        contrast = params.contrast,
        "Array mapped to image"
    );
    img
}
