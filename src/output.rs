//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! photo.jpg → photo (1).webp
//!     1000 × 800 → 500 × 400
//!     2.4 MB → 180.22 KB (7.3%)
//!     Took 412 ms
//! broken.png ✗ Conversion failed: Failed to decode broken.png: …
//!
//! Converted 1 of 2 files
//! ```
//!
//! ## Info
//!
//! ```text
//! photo.jpg
//!     Format: JPEG
//!     Dimensions: 1000 × 800
//!     Size: 2.4 MB
//!     Transparency: no
//! ```
//!
//! ## Formats
//!
//! ```text
//! Format  Ext   Quality  Transparency
//! JPEG    jpg   yes      no
//! PNG     png   no       yes
//! ```

use crate::formats::{ImageFormat, conversion_targets};
use crate::types::{ConversionResult, ImageInfo};
use std::path::Path;
use std::time::Duration;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Display name for a path: the file name, or the whole path if it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `412 ms` under a second, `1.25 s` above.
fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        format!("{} ms", d.as_millis())
    } else {
        format!("{:.2} s", d.as_secs_f64())
    }
}

/// Format one conversion outcome.
pub fn format_conversion(source: &Path, result: &ConversionResult) -> Vec<String> {
    if !result.success {
        let message = result.error_message.as_deref().unwrap_or("unknown error");
        return vec![format!("{} ✗ {}", display_name(source), message)];
    }

    let output = result
        .output_path
        .as_deref()
        .map(display_name)
        .unwrap_or_default();
    let orig = result.original_dimensions;
    let new = result.new_dimensions;

    let mut lines = vec![format!("{} → {}", display_name(source), output)];
    if orig != new {
        lines.push(format!(
            "{}{} × {} → {} × {}",
            indent(1),
            orig.width,
            orig.height,
            new.width,
            new.height
        ));
    } else {
        lines.push(format!("{}{} × {}", indent(1), new.width, new.height));
    }
    lines.push(format!(
        "{}{} → {} ({:.1}%)",
        indent(1),
        result.formatted_original_size(),
        result.formatted_new_size(),
        result.compression_ratio()
    ));
    lines.push(format!("{}Took {}", indent(1), format_duration(result.elapsed)));
    lines
}

/// Format a batch of conversions followed by a summary line.
pub fn format_batch(outcomes: &[(&Path, &ConversionResult)]) -> Vec<String> {
    let mut lines: Vec<String> = outcomes
        .iter()
        .flat_map(|(source, result)| format_conversion(source, result))
        .collect();
    if outcomes.len() > 1 {
        let ok = outcomes.iter().filter(|(_, r)| r.success).count();
        lines.push(String::new());
        lines.push(format!("Converted {} of {} files", ok, outcomes.len()));
    }
    lines
}

/// Format a source image snapshot.
pub fn format_image_info(info: &ImageInfo) -> Vec<String> {
    vec![
        info.name.clone(),
        format!("{}Format: {}", indent(1), info.detected_format),
        format!("{}Dimensions: {}", indent(1), info.dimensions_label()),
        format!("{}Size: {}", indent(1), info.formatted_file_size()),
        format!("{}Transparency: {}", indent(1), yes_no(info.has_transparency)),
    ]
}

/// Format the table of conversion targets.
pub fn format_formats() -> Vec<String> {
    let row = |name: &str, ext: &str, quality: &str, alpha: &str| {
        format!("{name:<8}{ext:<6}{quality:<9}{alpha}")
    };
    let mut lines = vec![row("Format", "Ext", "Quality", "Transparency")];
    lines.extend(conversion_targets().map(|f: ImageFormat| {
        row(
            f.display_name(),
            f.extension(),
            yes_no(f.supports_quality()),
            yes_no(f.supports_transparency()),
        )
    }));
    lines
}

pub fn print_batch(outcomes: &[(&Path, &ConversionResult)]) {
    for line in format_batch(outcomes) {
        println!("{line}");
    }
}

pub fn print_image_info(info: &ImageInfo) {
    for line in format_image_info(info) {
        println!("{line}");
    }
}

pub fn print_formats() {
    for line in format_formats() {
        println!("{line}");
    }
}
