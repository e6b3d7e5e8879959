//! # convert-me
//!
//! Convert raster images between JPEG, PNG, WebP, GIF, BMP, TIFF and ICO,
//! with optional resizing and an optional file-size target.
//!
//! # Architecture
//!
//! The engine is a single pipeline behind two entry points:
//!
//! ```text
//! get_image_info(path)      → ImageInfo | error
//! convert(path, &options)   → ConversionResult   (never errors)
//! ```
//!
//! Everything a UI, shell extension, or CLI needs to drive a conversion goes
//! through [`ConversionOptions`]; everything it gets back is a
//! [`ConversionResult`]. The engine has no state between calls.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`formats`] | Format catalog: extensions, names, quality/transparency flags, supported inputs |
//! | [`imaging`] | Resize geometry, the [`Codec`](imaging::Codec) trait and its `image`-crate implementation, size-targeted encoding |
//! | [`naming`] | Output path derivation and `name (N).ext` collision resolution |
//! | [`convert`] | The pipeline: load → resize → resolve → encode → persist, with failures as values |
//! | [`types`] | Caller-facing value objects (`ImageInfo`, `ConversionResult`) |
//! | [`config`] | `convert-me.toml` loading, merging, and validation for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Failures Are Values
//!
//! [`convert()`] catches every failure (missing source, unsupported target,
//! codec error, unwritable destination, cancellation) and returns it as a
//! failed [`ConversionResult`] with a human-readable message. Callers drive
//! the engine without any error plumbing of their own.
//!
//! ## Codec Behind a Trait
//!
//! The engine never touches pixels. Decode, resize, and encode go through
//! [`imaging::Codec`], so the whole pipeline, including the size search, is
//! unit tested against a recording mock whose encoded size is a pure
//! function of quality.
//!
//! ## Best-Effort Size Targets
//!
//! A target size is a budget, not a guarantee. The quality search keeps the
//! last quality known to fit; when nothing fits it still writes the smallest
//! candidate (quality 5) rather than failing.
//!
//! ## The Percentage Overload
//!
//! [`ResizeMode::Percentage`](imaging::ResizeMode::Percentage) reads its
//! percentage from `target_width`. This keeps option structs compatible with
//! existing callers; [`ConversionOptions::with_percentage`] hides it.

pub mod config;
pub mod convert;
pub mod formats;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod types;

pub use convert::{
    ConvertError, convert, convert_batch, convert_batch_with_codec, convert_with_codec,
    get_image_info, get_image_info_with_codec,
};
pub use formats::{ImageFormat, is_supported_extension};
pub use imaging::{CancelFlag, ConversionOptions, Quality, ResizeMode};
pub use types::{ConversionResult, ImageInfo, format_file_size};
