use thiserror::Error;

use crate::io::npy::DtypeKind;

#[derive(Error, Debug)]
pub enum Array2ImError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid NPY data: {0}")]
    InvalidNpy(String),

    #[error("Unsupported NPY format version {major}.{minor}")]
    UnsupportedNpyVersion { major: u8, minor: u8 },

    #[error("Data type '{0}' not supported.")]
    UnsupportedDataType(DtypeKind),

    #[error("Unsupported item size {size} for data type '{kind}'")]
    UnsupportedItemSize { kind: DtypeKind, size: usize },

    #[error("Expected a two-dimensional array. Got an array with shape {shape} instead.")]
    NotTwoDimensional { shape: String },

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Bad parameter for {name}. Expected {expected}, got '{value}' instead.")]
    InvalidParameter {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Bad parameter for quality. Expected integer between 1 and 100, got '{0}' instead.")]
    InvalidQuality(i64),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("JPEG encoding error: {0}")]
    JpegError(#[from] jpeg_encoder::EncodingError),
}

pub type Result<T> = std::result::Result<T, Array2ImError>;
