//! Codec trait and shared types.
//!
//! The [`Codec`] trait defines the three operations the conversion engine
//! needs from an image library: decode, resize, and encode-to-bytes. The
//! engine never touches pixels directly, so any library that can do those
//! three things for the seven target formats can drive it.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image` crate.

use crate::formats::ImageFormat;
use super::params::Quality;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("{format} encode failed: {message}")]
    Encode {
        format: ImageFormat,
        message: String,
    },
    #[error("Resize to {0} failed: {1}")]
    Resize(Dimensions, String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either axis is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded source image.
#[derive(Debug, Clone)]
pub struct Decoded<P> {
    pub pixels: P,
    pub dimensions: Dimensions,
    /// Container format the decoder detected, uppercase (`"PNG"`, `"JPEG"`),
    /// or `"Unknown"`.
    pub format_name: String,
}

/// Trait for image codecs.
///
/// `Pixels` is whatever in-memory representation the codec works on. The
/// engine only moves it between calls.
pub trait Codec: Sync {
    type Pixels;

    /// Load and decode an image file.
    fn decode(&self, path: &Path) -> Result<Decoded<Self::Pixels>, CodecError>;

    /// Resample to exactly `size`, ignoring aspect ratio.
    fn resize(&self, pixels: &Self::Pixels, size: Dimensions)
    -> Result<Self::Pixels, CodecError>;

    /// Encode into an in-memory buffer.
    ///
    /// `quality` is honored only by formats that
    /// [support it](ImageFormat::supports_quality); others ignore it.
    fn encode(
        &self,
        pixels: &Self::Pixels,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;
}
