use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::consts::{COLOR_CHANNEL_COUNT, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY};
use crate::error::{Array2ImError, Result};

pub use image::ImageFormat;

/// JPEG quality in 1..=100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct JpegQuality(u8);

impl JpegQuality {
    pub fn new(value: i64) -> Result<Self> {
        if (MIN_JPEG_QUALITY as i64..=MAX_JPEG_QUALITY as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Array2ImError::InvalidQuality(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        Self(DEFAULT_JPEG_QUALITY)
    }
}

impl TryFrom<i64> for JpegQuality {
    type Error = Array2ImError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<JpegQuality> for u8 {
    fn from(q: JpegQuality) -> u8 {
        q.0
    }
}

/// Encoder settings. Only JPEG output looks at them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EncodeOptions {
    pub quality: JpegQuality,
    pub progressive: bool,
}

/// Pick an output format from a file extension, e.g. `out.JPG` -> JPEG.
pub fn format_from_path(path: &Path) -> Result<ImageFormat> {
    Ok(ImageFormat::from_path(path)?)
}

/// Pick an output format from a name or extension such as `png` or `jpeg`.
pub fn format_from_name(name: &str) -> Option<ImageFormat> {
    ImageFormat::from_extension(name.trim_start_matches('.'))
}

/// Encode `img` in `format` and write it to `out`.
pub fn encode_image<W: Write>(
    img: &RgbImage,
    format: ImageFormat,
    options: &EncodeOptions,
    mut out: W,
) -> Result<()> {
    if format == ImageFormat::Jpeg {
        if options.progressive {
            encode_progressive_jpeg(img, options.quality, &mut out)?;
        } else {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, options.quality.get());
            encoder.encode_image(img)?;
        }
    } else {
        if options.progressive || options.quality != JpegQuality::default() {
            tracing::debug!(?format, "JPEG options ignored for non-JPEG output");
        }
        // Most encoders need Seek, which pipes do not offer.
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format)?;
        out.write_all(buf.get_ref())?;
    }
    out.flush()?;

    tracing::info!(
        ?format,
        width = img.width(),
        height = img.height(),
        quality = options.quality.get(),
        progressive = options.progressive,
        "Image encoded"
    );
    Ok(())
}

fn encode_progressive_jpeg<W: Write>(img: &RgbImage, quality: JpegQuality, out: W) -> Result<()> {
    let (w, h) = img.dimensions();
    let (width, height) = match (u16::try_from(w), u16::try_from(h)) {
        (Ok(width), Ok(height)) => (width, height),
        _ => {
            return Err(Array2ImError::InvalidDimensions {
                width: w as usize,
                height: h as usize,
            })
        }
    };
    debug_assert_eq!(
        img.as_raw().len(),
        w as usize * h as usize * COLOR_CHANNEL_COUNT
    );

    let mut encoder = jpeg_encoder::Encoder::new(out, quality.get());
    encoder.set_progressive(true);
    encoder.encode(img.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)?;
    Ok(())
}

/// Save an image, choosing the format from the file extension.
pub fn save_image(img: &RgbImage, path: &Path, options: &EncodeOptions) -> Result<()> {
    let format = format_from_path(path)?;
    let file = File::create(path)?;
    encode_image(img, format, options, BufWriter::new(file))
}
