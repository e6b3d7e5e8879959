//! Parameter types for a conversion.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between callers (the CLI, a GUI, tests) and the
//! [`convert`](crate::convert) pipeline, which hands the pixel work to a
//! [`Codec`](super::backend::Codec).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`ResizeMode`]: Which geometry rule applies before encoding.
//! - [`ConversionOptions`]: Everything one conversion needs: target format,
//!   quality, size budget, resize rule, output path, overwrite policy.

use crate::formats::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32")]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Geometry rule applied before encoding. Exactly one is active per conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMode {
    /// Keep the source dimensions.
    #[default]
    None,
    /// Use `target_width` × `target_height`; a zero axis keeps the source value.
    ExactSize,
    /// Shrink to `target_width` when wider.
    MaxWidth,
    /// Shrink to `target_height` when taller.
    MaxHeight,
    /// Scale both axes by `target_width` percent.
    Percentage,
}

/// Options for a single conversion.
///
/// `target_width` doubles as the percentage value when `resize_mode` is
/// [`ResizeMode::Percentage`]; use [`ConversionOptions::with_percentage`] to
/// set it without remembering the overload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub target_format: ImageFormat,
    /// Only meaningful when the target format supports quality.
    pub quality: Quality,
    /// Byte budget in KiB; 0 means unconstrained.
    pub target_size_kb: u64,
    pub resize_mode: ResizeMode,
    pub target_width: u32,
    pub target_height: u32,
    pub maintain_aspect_ratio: bool,
    /// Explicit destination. When absent the output lands next to the source.
    pub output_path: Option<PathBuf>,
    pub overwrite_existing: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            target_format: ImageFormat::Png,
            quality: Quality::default(),
            target_size_kb: 0,
            resize_mode: ResizeMode::None,
            target_width: 0,
            target_height: 0,
            maintain_aspect_ratio: true,
            output_path: None,
            overwrite_existing: false,
        }
    }
}

impl ConversionOptions {
    /// Options targeting `format` with that format's default quality.
    pub fn for_format(format: ImageFormat) -> Self {
        Self {
            target_format: format,
            quality: Quality::new(format.default_quality()),
            ..Self::default()
        }
    }

    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = Quality::new(quality);
        self
    }

    pub fn with_target_size_kb(mut self, kb: u64) -> Self {
        self.target_size_kb = kb;
        self
    }

    pub fn with_exact_size(mut self, width: u32, height: u32) -> Self {
        self.resize_mode = ResizeMode::ExactSize;
        self.target_width = width;
        self.target_height = height;
        self
    }

    pub fn with_max_width(mut self, width: u32) -> Self {
        self.resize_mode = ResizeMode::MaxWidth;
        self.target_width = width;
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.resize_mode = ResizeMode::MaxHeight;
        self.target_height = height;
        self
    }

    /// Percentage scaling. The value travels in `target_width`.
    pub fn with_percentage(mut self, percent: u32) -> Self {
        self.resize_mode = ResizeMode::Percentage;
        self.target_width = percent;
        self
    }

    pub fn with_aspect_ratio(mut self, maintain: bool) -> Self {
        self.maintain_aspect_ratio = maintain;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    /// Target size in bytes (KiB × 1024).
    pub fn target_bytes(&self) -> u64 {
        self.target_size_kb.saturating_mul(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn deserialized_quality_is_clamped() {
        assert_eq!(serde_json::from_str::<Quality>("300").unwrap(), Quality(100));
        assert_eq!(serde_json::from_str::<Quality>("0").unwrap(), Quality(1));
        assert_eq!(serde_json::from_str::<Quality>("42").unwrap(), Quality(42));
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn default_options() {
        let options = ConversionOptions::default();
        assert_eq!(options.target_format, ImageFormat::Png);
        assert_eq!(options.quality.value(), 85);
        assert_eq!(options.target_size_kb, 0);
        assert_eq!(options.resize_mode, ResizeMode::None);
        assert!(options.maintain_aspect_ratio);
        assert!(options.output_path.is_none());
        assert!(!options.overwrite_existing);
    }

    #[test]
    fn for_format_picks_format_default_quality() {
        assert_eq!(
            ConversionOptions::for_format(ImageFormat::Jpeg).quality.value(),
            85
        );
        assert_eq!(
            ConversionOptions::for_format(ImageFormat::Bmp).quality.value(),
            100
        );
    }

    #[test]
    fn percentage_is_carried_in_target_width() {
        let options = ConversionOptions::default().with_percentage(50);
        assert_eq!(options.resize_mode, ResizeMode::Percentage);
        assert_eq!(options.target_width, 50);
        assert_eq!(options.target_height, 0);
    }

    #[test]
    fn builder_quality_is_clamped() {
        let options = ConversionOptions::default().with_quality(400);
        assert_eq!(options.quality.value(), 100);
    }

    #[test]
    fn target_bytes_is_kib() {
        let options = ConversionOptions::default().with_target_size_kb(50);
        assert_eq!(options.target_bytes(), 51_200);
    }
}
