use serde::{Deserialize, Serialize};

use crate::colormap::ColorMapParams;
use crate::error::{Array2ImError, Result};
use crate::io::image_io::{EncodeOptions, JpegQuality};

/// Render settings, as stored in a TOML config file.
///
/// ```toml
/// [colormap]
/// brightness = 2.0
/// contrast = 0.5
///
/// [jpeg]
/// quality = 90
/// progressive = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub colormap: ColorMapParams,
    pub jpeg: JpegConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JpegConfig {
    pub quality: JpegQuality,
    pub progressive: bool,
}

impl From<JpegConfig> for EncodeOptions {
    fn from(cfg: JpegConfig) -> Self {
        Self {
            quality: cfg.quality,
            progressive: cfg.progressive,
        }
    }
}

impl RenderConfig {
    /// Reject brightness or contrast values that are not finite.
    ///
    /// Negative values are allowed through: the color map stays total for
    /// them, it just renders the affected cells black.
    pub fn validate(&self) -> Result<()> {
        check_finite("brightness", self.colormap.brightness)?;
        check_finite("contrast", self.colormap.contrast)?;
        Ok(())
    }

    pub fn encode_options(&self) -> EncodeOptions {
        self.jpeg.into()
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Array2ImError::InvalidParameter {
            name,
            expected: "a finite floating point or integer",
            value: value.to_string(),
        })
    }
}
