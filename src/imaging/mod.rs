//! Image processing: geometry, codecs, and size-targeted encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (content-sniffed) |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | `image` encoders; `webp` for lossy WebP |
//! | **Target size** | binary search over quality, in memory |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for resize geometry (unit testable)
//! - **Parameters**: Conversion options and the quality newtype
//! - **Backend**: [`Codec`] trait + [`RustCodec`]
//! - **Target size**: Quality search against a byte budget

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;
pub mod target_size;

pub use backend::{Codec, CodecError, Decoded, Dimensions};
pub use calculations::{ResizeRequest, calculate_resize};
pub use params::{ConversionOptions, Quality, ResizeMode};
pub use rust_backend::RustCodec;
pub use target_size::{CancelFlag, SearchError, SizedEncoding, encode_to_target_size};
