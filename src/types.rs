//! Value objects handed back to callers.
//!
//! [`ImageInfo`] is a read-only snapshot of a source file; [`ConversionResult`]
//! is the outcome of one conversion. Both serialize to JSON for `--json` output.

use crate::imaging::Dimensions;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Snapshot of a source image, produced once per load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    /// File name including extension.
    pub name: String,
    /// Lowercase extension with leading dot (`".jpg"`), or empty.
    pub extension: String,
    pub directory: PathBuf,
    pub file_size_bytes: u64,
    pub width: u32,
    pub height: u32,
    /// Decoder-detected container name (`"PNG"`, `"JPEG"`, …).
    pub detected_format: String,
    pub has_transparency: bool,
}

impl ImageInfo {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// `"W × H"`
    pub fn dimensions_label(&self) -> String {
        format!("{} × {}", self.width, self.height)
    }

    /// Width over height; 1.0 for a zero height.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0 {
            self.width as f64 / self.height as f64
        } else {
            1.0
        }
    }

    pub fn formatted_file_size(&self) -> String {
        format_file_size(self.file_size_bytes)
    }
}

/// Outcome of one conversion attempt.
///
/// `output_path` is set only on success, `error_message` only on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub original_size_bytes: u64,
    pub new_size_bytes: u64,
    pub original_dimensions: Dimensions,
    pub new_dimensions: Dimensions,
    pub elapsed: Duration,
}

impl ConversionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            error_message: Some(message.into()),
            original_size_bytes: 0,
            new_size_bytes: 0,
            original_dimensions: Dimensions::default(),
            new_dimensions: Dimensions::default(),
            elapsed: Duration::ZERO,
        }
    }

    /// New size as a percentage of the original; 100 when the original is empty.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size_bytes > 0 {
            self.new_size_bytes as f64 / self.original_size_bytes as f64 * 100.0
        } else {
            100.0
        }
    }

    pub fn formatted_original_size(&self) -> String {
        format_file_size(self.original_size_bytes)
    }

    pub fn formatted_new_size(&self) -> String {
        format_file_size(self.new_size_bytes)
    }
}

/// Human-readable byte count with binary prefixes.
///
/// Divides by 1024 while the value is at least 1024 and a larger unit
/// remains, then prints up to two decimals with trailing zeros dropped:
/// `512 B`, `1.5 KB`, `2 MB`, `3072 GB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{size:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
