//! The conversion pipeline.
//!
//! One call converts one source file:
//!
//! ```text
//! check source ─► load ─► resize? ─► resolve output ─► mkdir -p ─► encode ─► persist
//!                  └──────────────── timed ─────────────────────────────────────┘
//! ```
//!
//! Encoding takes one of two paths:
//!
//! - **Direct**: one encode at the configured quality.
//! - **Size-constrained**: when `target_size_kb > 0` and the target format
//!   supports quality, the [quality search](crate::imaging::target_size)
//!   runs entirely in memory before committing.
//!
//! Either way the encoded bytes go to a temp file beside the destination and
//! are renamed into place, so the destination never holds a partial image.
//!
//! [`convert`] never returns an error: every failure becomes a
//! [`ConversionResult`] with `success == false` and a readable message.
//! [`get_image_info`] is the one entry point that surfaces errors directly.
//!
//! Calls share no state and may run on any thread. Two concurrent calls that
//! derive the same destination would both pick the same free name;
//! [`convert_batch`] serializes those.

use crate::formats::ImageFormat;
use crate::imaging::{
    CancelFlag, Codec, CodecError, ConversionOptions, Dimensions, ResizeRequest, RustCodec,
    SearchError, calculate_resize, encode_to_target_size,
};
use crate::naming::{derive_output_path, group_by_destination, resolve_collision};
use crate::types::{ConversionResult, ImageInfo};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("{0} cannot be used as a conversion target")]
    UnsupportedTarget(ImageFormat),
    #[error("Could not create output directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Conversion failed: {0}")]
    EncodeFailed(#[from] CodecError),
    #[error("Conversion failed: could not write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Conversion cancelled")]
    Cancelled,
    #[error("Conversion failed: {0}")]
    Unknown(String),
}

impl From<SearchError> for ConvertError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Codec(c) => ConvertError::EncodeFailed(c),
            SearchError::Cancelled(_) => ConvertError::Cancelled,
        }
    }
}

/// Largest resize target accepted, in pixels (16384 × 16384, 1 GiB as RGBA).
pub const MAX_OUTPUT_PIXELS: u64 = 16384 * 16384;

/// Read a source file's metadata and dimensions with the default codec.
pub fn get_image_info(path: &Path) -> Result<ImageInfo, ConvertError> {
    get_image_info_with_codec(&RustCodec::new(), path)
}

/// Read a source file's metadata and dimensions with a specific codec.
pub fn get_image_info_with_codec<C: Codec>(
    codec: &C,
    path: &Path,
) -> Result<ImageInfo, ConvertError> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| ConvertError::SourceNotFound(path.to_path_buf()))?;
    let decoded = codec.decode(path)?;

    let has_transparency = matches!(decoded.format_name.as_str(), "PNG" | "GIF" | "WEBP");

    Ok(ImageInfo {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default(),
        directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        file_size_bytes: metadata.len(),
        width: decoded.dimensions.width,
        height: decoded.dimensions.height,
        detected_format: decoded.format_name,
        has_transparency,
    })
}

/// Convert `source` with the default codec.
pub fn convert(source: &Path, options: &ConversionOptions) -> ConversionResult {
    convert_with_codec(&RustCodec::new(), source, options, &CancelFlag::new())
}

/// Convert `source` with a specific codec and cancellation flag (allows
/// testing with a mock and aborting from another thread).
pub fn convert_with_codec<C: Codec>(
    codec: &C,
    source: &Path,
    options: &ConversionOptions,
    cancel: &CancelFlag,
) -> ConversionResult {
    let mut started = None;
    match run_pipeline(codec, source, options, cancel, &mut started) {
        Ok(result) => result,
        Err(e) => {
            debug!(source = %source.display(), error = %e, "conversion failed");
            ConversionResult {
                elapsed: started.map(|t: Instant| t.elapsed()).unwrap_or_default(),
                ..ConversionResult::failed(e.to_string())
            }
        }
    }
}

/// Convert many sources in parallel on the current rayon pool.
pub fn convert_batch(sources: &[PathBuf], options: &ConversionOptions) -> Vec<ConversionResult> {
    convert_batch_with_codec(&RustCodec::new(), sources, options, &CancelFlag::new())
}

/// [`convert_batch`] with a specific codec and cancellation flag.
///
/// Sources that derive the same output path run one after another, so each
/// one's collision check sees the file the previous one wrote. Results come
/// back in input order.
pub fn convert_batch_with_codec<C: Codec>(
    codec: &C,
    sources: &[PathBuf],
    options: &ConversionOptions,
    cancel: &CancelFlag,
) -> Vec<ConversionResult> {
    let mut indexed: Vec<(usize, ConversionResult)> = group_by_destination(sources, options)
        .into_par_iter()
        .flat_map_iter(|group| {
            group
                .into_iter()
                .map(|i| (i, convert_with_codec(codec, &sources[i], options, cancel)))
                .collect::<Vec<_>>()
        })
        .collect();
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, result)| result).collect()
}

fn run_pipeline<C: Codec>(
    codec: &C,
    source: &Path,
    options: &ConversionOptions,
    cancel: &CancelFlag,
    started: &mut Option<Instant>,
) -> Result<ConversionResult, ConvertError> {
    let source_meta = std::fs::metadata(source)
        .ok()
        .filter(|m| m.is_file())
        .ok_or_else(|| ConvertError::SourceNotFound(source.to_path_buf()))?;
    let format = options.target_format;
    if !format.is_valid_conversion_target() {
        return Err(ConvertError::UnsupportedTarget(format));
    }

    let clock = *started.insert(Instant::now());

    let decoded = codec.decode(source)?;
    let original = decoded.dimensions;
    let (pixels, current) = apply_resize(codec, decoded.pixels, original, options)?;

    let output = resolve_collision(
        &derive_output_path(source, options),
        options.overwrite_existing,
    );
    let dir = output
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !dir.is_dir() {
        std::fs::create_dir_all(dir).map_err(|e| ConvertError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let bytes = if options.target_size_kb > 0 && format.supports_quality() {
        let sized = encode_to_target_size(
            codec,
            &pixels,
            format,
            options.quality,
            options.target_bytes(),
            cancel,
        )?;
        debug!(
            iterations = sized.iterations,
            quality = sized.quality.value(),
            within_budget = sized.within_budget,
            "size search finished"
        );
        sized.bytes
    } else {
        if options.target_size_kb > 0 {
            debug!(%format, "target size ignored: format has no quality setting");
        }
        codec.encode(&pixels, format, options.quality)?
    };

    if cancel.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }
    persist(dir, &output, &bytes)?;

    let elapsed = clock.elapsed();
    info!(
        source = %source.display(),
        output = %output.display(),
        bytes = bytes.len(),
        ?elapsed,
        "converted"
    );

    Ok(ConversionResult {
        success: true,
        output_path: Some(output),
        error_message: None,
        original_size_bytes: source_meta.len(),
        new_size_bytes: bytes.len() as u64,
        original_dimensions: original,
        new_dimensions: current,
        elapsed,
    })
}

/// Apply the resize rule; the codec is only called when dimensions change.
fn apply_resize<C: Codec>(
    codec: &C,
    pixels: C::Pixels,
    current: Dimensions,
    options: &ConversionOptions,
) -> Result<(C::Pixels, Dimensions), ConvertError> {
    let request = ResizeRequest {
        mode: options.resize_mode,
        target_width: options.target_width,
        target_height: options.target_height,
        maintain_aspect_ratio: options.maintain_aspect_ratio,
    };
    let target = calculate_resize(current, &request);
    if target == current {
        return Ok((pixels, current));
    }
    if target.is_empty() {
        return Err(ConvertError::Unknown(format!(
            "resize produced an empty image ({target})"
        )));
    }
    if u64::from(target.width) * u64::from(target.height) > MAX_OUTPUT_PIXELS {
        return Err(ConvertError::Unknown(format!(
            "resize target {target} exceeds the {MAX_OUTPUT_PIXELS} pixel limit"
        )));
    }
    debug!(from = %current, to = %target, "resizing");
    Ok((codec.resize(&pixels, target)?, target))
}

/// Write `bytes` to a temp file in `dir`, then rename it over `output`.
fn persist(dir: &Path, output: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let write_failed = |source: std::io::Error| ConvertError::WriteFailed {
        path: output.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(bytes).map_err(write_failed)?;
    tmp.persist(output).map_err(|e| write_failed(e.error))?;
    Ok(())
}
