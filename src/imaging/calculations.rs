//! Pure calculation functions for resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::ResizeMode;

/// The geometry half of [`ConversionOptions`](super::params::ConversionOptions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeRequest {
    pub mode: ResizeMode,
    pub target_width: u32,
    pub target_height: u32,
    pub maintain_aspect_ratio: bool,
}

/// Calculate the output dimensions for a resize request.
///
/// | Mode | Applies when | Result |
/// |---|---|---|
/// | `None` | never | unchanged |
/// | `ExactSize` | always | each non-zero target replaces its axis independently |
/// | `MaxWidth` | `target_width > 0` and `width > target_width` | width = target, height scaled (or kept) |
/// | `MaxHeight` | `target_height > 0` and `height > target_height` | height = target, width scaled (or kept) |
/// | `Percentage` | `target_width > 0` | both axes × `target_width / 100` |
///
/// Scaled values are truncated toward zero. The result may be degenerate
/// (a zero axis) for tiny percentages or extreme aspect ratios; callers
/// decide what to do with that.
///
/// # Examples
/// ```
/// # use convert_me::imaging::{calculate_resize, Dimensions, ResizeMode, ResizeRequest};
/// let request = ResizeRequest {
///     mode: ResizeMode::MaxWidth,
///     target_width: 500,
///     target_height: 0,
///     maintain_aspect_ratio: true,
/// };
/// assert_eq!(
///     calculate_resize(Dimensions::new(1000, 800), &request),
///     Dimensions::new(500, 400)
/// );
/// ```
pub fn calculate_resize(current: Dimensions, request: &ResizeRequest) -> Dimensions {
    let Dimensions { width, height } = current;

    match request.mode {
        ResizeMode::None => current,
        ResizeMode::ExactSize => Dimensions {
            width: if request.target_width > 0 {
                request.target_width
            } else {
                width
            },
            height: if request.target_height > 0 {
                request.target_height
            } else {
                height
            },
        },
        ResizeMode::MaxWidth if request.target_width > 0 && width > request.target_width => {
            let new_height = if request.maintain_aspect_ratio {
                scale_axis(height, request.target_width as f64 / width as f64)
            } else {
                height
            };
            Dimensions {
                width: request.target_width,
                height: new_height,
            }
        }
        ResizeMode::MaxHeight if request.target_height > 0 && height > request.target_height => {
            let new_width = if request.maintain_aspect_ratio {
                scale_axis(width, request.target_height as f64 / height as f64)
            } else {
                width
            };
            Dimensions {
                width: new_width,
                height: request.target_height,
            }
        }
        ResizeMode::Percentage if request.target_width > 0 => {
            let scale = request.target_width as f64 / 100.0;
            Dimensions {
                width: scale_axis(width, scale),
                height: scale_axis(height, scale),
            }
        }
        // Guard not met: pass through.
        ResizeMode::MaxWidth | ResizeMode::MaxHeight | ResizeMode::Percentage => current,
    }
}

/// Multiply and truncate toward zero, saturating at `u32::MAX`.
fn scale_axis(value: u32, factor: f64) -> u32 {
    (value as f64 * factor) as u32
}
