//! The format catalog: every image format the converter knows about and the
//! fixed facts attached to it.
//!
//! Capabilities are a closed lookup table, not a trait hierarchy. Each
//! [`ImageFormat`] maps to exactly one [`FormatInfo`] row:
//!
//! | Format | Extension | Quality | Transparency | Target |
//! |--------|-----------|---------|--------------|--------|
//! | JPEG   | `jpg`     | yes     | no           | yes    |
//! | PNG    | `png`     | no      | yes          | yes    |
//! | WebP   | `webp`    | yes     | yes          | yes    |
//! | GIF    | `gif`     | no      | yes          | yes    |
//! | BMP    | `bmp`     | no      | no           | yes    |
//! | TIFF   | `tiff`    | no      | no           | yes    |
//! | ICO    | `ico`     | no      | yes          | yes    |
//! | SVG    | `svg`     | no      | no           | no     |
//!
//! SVG is recognized as a source format but there is no encoder for it, so it
//! never appears in [`conversion_targets`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Extensions accepted as conversion inputs (lowercase, without the dot).
const SUPPORTED_INPUT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Ico,
    Svg,
}

/// Static metadata for one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Canonical file extension, lowercase, without the dot.
    pub extension: &'static str,
    pub display_name: &'static str,
    pub supports_quality: bool,
    pub supports_transparency: bool,
    pub conversion_target: bool,
}

const fn row(
    extension: &'static str,
    display_name: &'static str,
    supports_quality: bool,
    supports_transparency: bool,
    conversion_target: bool,
) -> FormatInfo {
    FormatInfo {
        extension,
        display_name,
        supports_quality,
        supports_transparency,
        conversion_target,
    }
}

const JPEG: FormatInfo = row("jpg", "JPEG", true, false, true);
const PNG: FormatInfo = row("png", "PNG", false, true, true);
const WEBP: FormatInfo = row("webp", "WebP", true, true, true);
const GIF: FormatInfo = row("gif", "GIF", false, true, true);
const BMP: FormatInfo = row("bmp", "BMP", false, false, true);
const TIFF: FormatInfo = row("tiff", "TIFF", false, false, true);
const ICO: FormatInfo = row("ico", "ICO", false, true, true);
const SVG: FormatInfo = row("svg", "SVG", false, false, false);

impl ImageFormat {
    /// Every format, in declaration order.
    pub const ALL: [ImageFormat; 8] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::WebP,
        ImageFormat::Gif,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
        ImageFormat::Ico,
        ImageFormat::Svg,
    ];

    pub const fn info(self) -> &'static FormatInfo {
        match self {
            ImageFormat::Jpeg => &JPEG,
            ImageFormat::Png => &PNG,
            ImageFormat::WebP => &WEBP,
            ImageFormat::Gif => &GIF,
            ImageFormat::Bmp => &BMP,
            ImageFormat::Tiff => &TIFF,
            ImageFormat::Ico => &ICO,
            ImageFormat::Svg => &SVG,
        }
    }

    pub fn extension(self) -> &'static str {
        self.info().extension
    }

    pub fn display_name(self) -> &'static str {
        self.info().display_name
    }

    /// True only for formats with a tunable fidelity parameter (JPEG, WebP).
    pub fn supports_quality(self) -> bool {
        self.info().supports_quality
    }

    pub fn supports_transparency(self) -> bool {
        self.info().supports_transparency
    }

    /// False only for SVG.
    pub fn is_valid_conversion_target(self) -> bool {
        self.info().conversion_target
    }

    /// Starting quality when the caller has no preference: 85 for lossy
    /// formats, 100 for everything else.
    pub fn default_quality(self) -> u32 {
        if self.supports_quality() { 85 } else { 100 }
    }

    /// Parse a user-supplied format name or extension, case-insensitively.
    ///
    /// Accepts the aliases `jpeg`/`jpg` and `tiff`/`tif`, with or without a
    /// leading dot.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "ico" => Some(ImageFormat::Ico),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }

    /// Guess the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_name)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Formats that can be written, in declaration order.
pub fn conversion_targets() -> impl Iterator<Item = ImageFormat> {
    ImageFormat::ALL
        .into_iter()
        .filter(|f| f.is_valid_conversion_target())
}

/// Whether `path` has an extension the converter accepts as input.
///
/// Callers (drag-and-drop, pickers, directory expansion) use this before
/// handing a file to the engine. The match is case-insensitive.
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_INPUT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_format_has_metadata() {
        for format in ImageFormat::ALL {
            let info = format.info();
            assert!(!info.extension.is_empty(), "{format:?} has no extension");
            assert!(!info.display_name.is_empty(), "{format:?} has no name");
        }
    }

    #[test]
    fn quality_only_for_jpeg_and_webp() {
        let lossy: Vec<_> = ImageFormat::ALL
            .into_iter()
            .filter(|f| f.supports_quality())
            .collect();
        assert_eq!(lossy, vec![ImageFormat::Jpeg, ImageFormat::WebP]);
    }

    #[test]
    fn transparency_formats() {
        let alpha: Vec<_> = ImageFormat::ALL
            .into_iter()
            .filter(|f| f.supports_transparency())
            .collect();
        assert_eq!(
            alpha,
            vec![
                ImageFormat::Png,
                ImageFormat::WebP,
                ImageFormat::Gif,
                ImageFormat::Ico
            ]
        );
    }

    #[test]
    fn svg_is_the_only_invalid_target() {
        assert!(!ImageFormat::Svg.is_valid_conversion_target());
        for format in ImageFormat::ALL {
            if format != ImageFormat::Svg {
                assert!(format.is_valid_conversion_target(), "{format:?}");
            }
        }
    }

    #[test]
    fn quality_and_target_flags_are_independent() {
        for format in [
            ImageFormat::Png,
            ImageFormat::Gif,
            ImageFormat::Bmp,
            ImageFormat::Tiff,
            ImageFormat::Ico,
        ] {
            assert!(!format.supports_quality());
            assert!(format.is_valid_conversion_target());
        }
    }

    #[test]
    fn conversion_targets_exclude_svg() {
        let targets: Vec<_> = conversion_targets().collect();
        assert_eq!(targets.len(), 7);
        assert!(!targets.contains(&ImageFormat::Svg));
        assert_eq!(targets[0], ImageFormat::Jpeg);
    }

    #[test]
    fn default_quality_depends_on_lossiness() {
        assert_eq!(ImageFormat::Jpeg.default_quality(), 85);
        assert_eq!(ImageFormat::WebP.default_quality(), 85);
        assert_eq!(ImageFormat::Png.default_quality(), 100);
        assert_eq!(ImageFormat::Ico.default_quality(), 100);
    }

    #[test]
    fn from_name_accepts_aliases_and_case() {
        assert_eq!(ImageFormat::from_name("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_name("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_name(".tif"), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::from_name("WebP"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_name(" svg "), Some(ImageFormat::Svg));
        assert_eq!(ImageFormat::from_name("avif"), None);
        assert_eq!(ImageFormat::from_name(""), None);
    }

    #[test]
    fn from_path_uses_extension() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/a/b/photo.PNG")),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn supported_extension_is_case_insensitive() {
        assert!(is_supported_extension(Path::new("a.JPG")));
        assert!(is_supported_extension(Path::new("a.jpeg")));
        assert!(is_supported_extension(Path::new("dir/a.Tif")));
        assert!(is_supported_extension(Path::new("a.ico")));
    }

    #[test]
    fn unsupported_extensions_rejected() {
        assert!(!is_supported_extension(Path::new("a.svg")));
        assert!(!is_supported_extension(Path::new("a.txt")));
        assert!(!is_supported_extension(Path::new("jpg")));
        assert!(!is_supported_extension(Path::new("a.")));
    }

    #[test]
    fn display_uses_display_name() {
        assert_eq!(ImageFormat::WebP.to_string(), "WebP");
        assert_eq!(ImageFormat::Tiff.to_string(), "TIFF");
    }
}
