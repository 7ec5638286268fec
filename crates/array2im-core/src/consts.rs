/// Default magnitude multiplier applied before the saturation curve.
pub const DEFAULT_BRIGHTNESS: f64 = 1.0;

/// Default exponent applied to the scaled magnitude.
pub const DEFAULT_CONTRAST: f64 = 1.0;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Lowest accepted JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Highest accepted JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Base of the saturation curve `1 - base^x`. Each unit of scaled magnitude
/// halves the remaining distance to full intensity.
pub const SATURATION_BASE: f64 = 0.5;

/// Scale applied to the saturation curve before truncation to u8.
pub const CHANNEL_SCALE: f64 = 256.0;

/// Upper clip applied to channel intensities (the curve reaches 256 only at infinity).
pub const CHANNEL_MAX: f64 = 255.0;

/// Number of channels in the output image (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Magic prefix of every NPY stream.
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Upper bound on a single NPY header; numpy itself refuses larger ones.
pub const NPY_MAX_HEADER_LEN: usize = 1 << 20;
