//! Pure Rust codec built on the `image` crate, plus libwebp for lossy WebP.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP, ICO) | `image::ImageReader` with content sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` (alpha dropped) |
//! | Encode → PNG | `PngEncoder` at `CompressionType::Best` |
//! | Encode → WebP | `webp::Encoder::encode_simple` (lossy, quality-driven) |
//! | Encode → GIF / BMP / TIFF | `DynamicImage::write_to` |
//! | Encode → ICO | `IcoEncoder`, frame downscaled to fit 256×256 |
//!
//! SVG sources are recognized by the format catalog but have no rasterizer
//! here; decoding one fails with a decode error.

use super::backend::{Codec, CodecError, Decoded, Dimensions};
use super::params::Quality;
use crate::formats::ImageFormat;
use image::codecs::ico::IcoEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Largest edge an ICO frame may have.
const ICO_MAX_EDGE: u32 = 256;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Uppercase name of a detected container format.
fn format_name(format: Option<image::ImageFormat>) -> &'static str {
    match format {
        Some(image::ImageFormat::Jpeg) => "JPEG",
        Some(image::ImageFormat::Png) => "PNG",
        Some(image::ImageFormat::Gif) => "GIF",
        Some(image::ImageFormat::WebP) => "WEBP",
        Some(image::ImageFormat::Bmp) => "BMP",
        Some(image::ImageFormat::Tiff) => "TIFF",
        Some(image::ImageFormat::Ico) => "ICO",
        _ => "Unknown",
    }
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> CodecError {
    CodecError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn encode_error(format: ImageFormat, e: impl std::fmt::Display) -> CodecError {
    CodecError::Encode {
        format,
        message: e.to_string(),
    }
}

/// Write through one of the `image` crate's generic encoders.
fn write_with(img: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| e.to_string())?;
    Ok(buf)
}

/// Encoder quality, clamped in case a `Quality` was built from its raw field.
fn quality_percent(quality: Quality) -> u8 {
    quality.value().clamp(1, 100) as u8
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, String> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality_percent(quality));
    rgb.write_with_encoder(encoder).map_err(|e| e.to_string())?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
    img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, String> {
    let rgba = img.to_rgba8();
    let memory = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        .encode_simple(false, f32::from(quality_percent(quality)))
        .map_err(|e| format!("{e:?}"))?;
    Ok(memory.to_vec())
}

fn encode_ico(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let frame = if img.width() > ICO_MAX_EDGE || img.height() > ICO_MAX_EDGE {
        img.resize(ICO_MAX_EDGE, ICO_MAX_EDGE, FilterType::Lanczos3)
    } else {
        img.clone()
    };
    let rgba = DynamicImage::ImageRgba8(frame.to_rgba8());
    let mut buf = Vec::new();
    rgba.write_with_encoder(IcoEncoder::new(&mut buf))
        .map_err(|e| e.to_string())?;
    Ok(buf)
}

impl Codec for RustCodec {
    type Pixels = DynamicImage;

    fn decode(&self, path: &Path) -> Result<Decoded<DynamicImage>, CodecError> {
        let reader = ImageReader::open(path)?
            .with_guessed_format()
            .map_err(CodecError::Io)?;
        let detected = reader.format();
        let img = reader.decode().map_err(|e| decode_error(path, e))?;
        Ok(Decoded {
            dimensions: Dimensions::new(img.width(), img.height()),
            format_name: format_name(detected).to_string(),
            pixels: img,
        })
    }

    fn resize(&self, pixels: &DynamicImage, size: Dimensions) -> Result<DynamicImage, CodecError> {
        if size.is_empty() {
            return Err(CodecError::Resize(size, "empty target".to_string()));
        }
        Ok(pixels.resize_exact(size.width, size.height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        pixels: &DynamicImage,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let rgba = || DynamicImage::ImageRgba8(pixels.to_rgba8());
        let encoded = match format {
            ImageFormat::Jpeg => encode_jpeg(pixels, quality),
            ImageFormat::Png => encode_png(pixels),
            ImageFormat::WebP => encode_webp(pixels, quality),
            ImageFormat::Gif => write_with(&rgba(), image::ImageFormat::Gif),
            ImageFormat::Bmp => write_with(&rgba(), image::ImageFormat::Bmp),
            ImageFormat::Tiff => write_with(&rgba(), image::ImageFormat::Tiff),
            ImageFormat::Ico => encode_ico(pixels),
            ImageFormat::Svg => Err("no encoder for SVG".to_string()),
        };
        encoded.map_err(|e| encode_error(format, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, RgbImage, RgbaImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    /// A noisy RGBA image: compresses poorly, so quality changes are visible.
    fn noisy_rgba(width: u32, height: u32) -> DynamicImage {
        let mut seed: u32 = 0x1234_5678;
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [a, b, c, _] = seed.to_le_bytes();
            image::Rgba([a, b, c, 200])
        }))
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let decoded = RustCodec::new().decode(&path).unwrap();
        assert_eq!(decoded.dimensions, Dimensions::new(200, 150));
        assert_eq!(decoded.format_name, "JPEG");
    }

    #[test]
    fn decode_sniffs_content_not_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually-a-jpeg.png");
        create_test_jpeg(&path, 32, 16);

        let decoded = RustCodec::new().decode(&path).unwrap();
        assert_eq!(decoded.format_name, "JPEG");
    }

    #[test]
    fn decode_nonexistent_file_errors() {
        let result = RustCodec::new().decode(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(CodecError::Io(_))));
    }

    #[test]
    fn decode_garbage_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let result = RustCodec::new().decode(&path);
        assert!(matches!(result, Err(CodecError::Decode { .. })));
    }

    #[test]
    fn resize_is_exact() {
        let codec = RustCodec::new();
        let resized = codec
            .resize(&noisy_rgba(64, 48), Dimensions::new(10, 30))
            .unwrap();
        assert_eq!((resized.width(), resized.height()), (10, 30));
    }

    #[test]
    fn resize_to_empty_errors() {
        let codec = RustCodec::new();
        let result = codec.resize(&noisy_rgba(8, 8), Dimensions::new(0, 8));
        assert!(matches!(result, Err(CodecError::Resize(..))));
    }

    #[test]
    fn every_target_format_encodes_and_decodes() {
        let codec = RustCodec::new();
        let img = noisy_rgba(40, 30);
        for format in crate::formats::conversion_targets() {
            let bytes = codec.encode(&img, format, Quality::new(80)).unwrap();
            assert!(!bytes.is_empty(), "{format:?} produced no bytes");

            let decoded = image::load_from_memory(&bytes)
                .unwrap_or_else(|e| panic!("{format:?} output unreadable: {e}"));
            assert_eq!((decoded.width(), decoded.height()), (40, 30), "{format:?}");
        }
    }

    #[test]
    fn lossy_quality_changes_size() {
        let codec = RustCodec::new();
        let img = noisy_rgba(96, 96);
        for format in [ImageFormat::Jpeg, ImageFormat::WebP] {
            let low = codec.encode(&img, format, Quality::new(10)).unwrap();
            let high = codec.encode(&img, format, Quality::new(95)).unwrap();
            assert!(low.len() < high.len(), "{format:?}: {} vs {}", low.len(), high.len());
        }
    }

    #[test]
    fn out_of_range_raw_quality_encodes_as_100() {
        let codec = RustCodec::new();
        let img = noisy_rgba(48, 48);
        for format in [ImageFormat::Jpeg, ImageFormat::WebP] {
            let raw = codec.encode(&img, format, Quality(300)).unwrap();
            let max = codec.encode(&img, format, Quality::new(100)).unwrap();
            assert_eq!(raw, max, "{format:?}");
        }
    }

    #[test]
    fn ico_downscales_large_frames() {
        let codec = RustCodec::new();
        let bytes = codec
            .encode(&noisy_rgba(512, 300), ImageFormat::Ico, Quality::default())
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 256);
        assert!(decoded.height() <= 256);
    }

    #[test]
    fn svg_has_no_encoder() {
        let codec = RustCodec::new();
        let result = codec.encode(&noisy_rgba(4, 4), ImageFormat::Svg, Quality::default());
        assert!(matches!(
            result,
            Err(CodecError::Encode {
                format: ImageFormat::Svg,
                ..
            })
        ));
    }
}
