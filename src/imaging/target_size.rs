//! Encoding to a byte budget.
//!
//! For quality-capable formats (JPEG, WebP) the encoder binary-searches the
//! quality parameter against the encoded size:
//!
//! ```text
//! quality = start, min = 5, max = 100
//! repeat up to 10 times while min < max:
//!     encode at quality into memory
//!     fits  → min = quality + 1     (spend more of the budget)
//!     over  → max = quality - 1
//!     quality = (min + max) / 2
//! commit at max(min - 1, 5)
//! ```
//!
//! The commit quality is the last value known to fit, not the midpoint of
//! the final bracket. When even quality 5 is over budget the commit still
//! happens at 5: the budget is best-effort, never an error.
//!
//! Cost is up to 11 full encodes (10 probes + the commit), each proportional
//! to the pixel count. All probes stay in memory; nothing is written until
//! the caller persists the committed bytes.

use super::backend::{Codec, CodecError};
use super::params::Quality;
use crate::formats::ImageFormat;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

pub const MIN_SEARCH_QUALITY: i32 = 5;
pub const MAX_SEARCH_QUALITY: i32 = 100;
pub const MAX_SEARCH_ITERATIONS: u32 = 10;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("cancelled after {0} iterations")]
    Cancelled(u32),
}

/// Shared cancellation signal.
///
/// Clones share the same flag. The size search checks it between
/// iterations, which are the natural suspension points of a conversion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Binary-search state over the quality range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityBracket {
    /// Next quality to probe.
    pub quality: i32,
    pub min: i32,
    pub max: i32,
}

impl QualityBracket {
    pub fn new(start: Quality) -> Self {
        Self {
            quality: start.value() as i32,
            min: MIN_SEARCH_QUALITY,
            max: MAX_SEARCH_QUALITY,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.min >= self.max
    }

    /// Record whether the probe at `self.quality` fit the budget and move
    /// to the next probe.
    pub fn record(&mut self, fits: bool) {
        if fits {
            self.min = self.quality + 1;
        } else {
            self.max = self.quality - 1;
        }
        self.quality = (self.min + self.max) / 2;
    }

    /// Quality for the final encode: the last known-good value, floored at 5.
    pub fn commit_quality(&self) -> Quality {
        Quality::new(final_quality(self.min))
    }
}

/// `max(min - 1, 5)`.
pub fn final_quality(min: i32) -> u32 {
    (min - 1).max(MIN_SEARCH_QUALITY) as u32
}

/// Outcome of a size-constrained encode.
#[derive(Debug, Clone)]
pub struct SizedEncoding {
    pub bytes: Vec<u8>,
    pub quality: Quality,
    /// In-memory probe encodes performed (excludes the commit).
    pub iterations: u32,
    pub within_budget: bool,
}

/// Encode `pixels` as `format`, searching for the highest quality whose
/// output fits in `target_bytes`.
///
/// Callers only invoke this for formats that
/// [support quality](ImageFormat::supports_quality).
pub fn encode_to_target_size<C: Codec>(
    codec: &C,
    pixels: &C::Pixels,
    format: ImageFormat,
    start: Quality,
    target_bytes: u64,
    cancel: &CancelFlag,
) -> Result<SizedEncoding, SearchError> {
    let mut bracket = QualityBracket::new(start);
    let mut iterations = 0;

    while iterations < MAX_SEARCH_ITERATIONS && !bracket.is_settled() {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled(iterations));
        }
        let probe = bracket.quality;
        let size = codec.encode(pixels, format, Quality::new(probe as u32))?.len() as u64;
        iterations += 1;
        bracket.record(size <= target_bytes);
        debug!(
            iteration = iterations,
            quality = probe,
            bytes = size,
            target_bytes,
            min = bracket.min,
            max = bracket.max,
            "size search probe"
        );
    }

    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled(iterations));
    }

    let quality = bracket.commit_quality();
    let bytes = codec.encode(pixels, format, quality)?;
    let within_budget = bytes.len() as u64 <= target_bytes;
    if !within_budget {
        warn!(
            quality = quality.value(),
            bytes = bytes.len(),
            target_bytes,
            "could not reach target size; keeping smallest search result"
        );
    }

    Ok(SizedEncoding {
        bytes,
        quality,
        iterations,
        within_budget,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::Dimensions;
    use crate::imaging::backend::tests::MockCodec;

    fn run(codec: &MockCodec, start: u32, target: u64) -> SizedEncoding {
        encode_to_target_size(
            codec,
            &Dimensions::new(100, 100),
            ImageFormat::Jpeg,
            Quality::new(start),
            target,
            &CancelFlag::new(),
        )
        .unwrap()
    }

    #[test]
    fn final_quality_is_min_minus_one_floored_at_five() {
        assert_eq!(final_quality(61), 60);
        assert_eq!(final_quality(101), 100);
        assert_eq!(final_quality(6), 5);
        assert_eq!(final_quality(5), 5);
        assert_eq!(final_quality(0), 5);
    }

    #[test]
    fn bracket_raises_floor_on_fit() {
        let mut b = QualityBracket::new(Quality::new(85));
        b.record(true);
        assert_eq!((b.min, b.max, b.quality), (86, 100, 93));
    }

    #[test]
    fn bracket_lowers_ceiling_on_miss() {
        let mut b = QualityBracket::new(Quality::new(85));
        b.record(false);
        assert_eq!((b.min, b.max, b.quality), (5, 84, 44));
    }

    #[test]
    fn search_pins_exact_probe_sequence() {
        // size = 1000 * q, budget 50_000 → q ≤ 50 fits
        let codec = MockCodec::new(100, 100, 1000);
        let out = run(&codec, 85, 50_000);

        // 85 ✗ → [5,84] 44 ✓ → [45,84] 64 ✗ → [45,63] 54 ✗ → [45,53] 49 ✓
        // → [50,53] 51 ✗ → [50,50] settled; commit max(50-1,5) = 49
        assert_eq!(codec.encode_qualities(), vec![85, 44, 64, 54, 49, 51, 49]);
        assert_eq!(out.iterations, 6);
        assert_eq!(out.quality.value(), 49);
        assert_eq!(out.bytes.len(), 49_000);
        assert!(out.within_budget);
    }

    #[test]
    fn search_terminates_within_ten_iterations() {
        for budget in [1u64, 4_999, 5_000, 37_123, 99_999, 100_000, 10_000_000] {
            let codec = MockCodec::new(100, 100, 1000);
            let out = run(&codec, 85, budget);
            assert!(out.iterations <= MAX_SEARCH_ITERATIONS);
            assert!(codec.encode_qualities().len() <= 11);
            assert!((5..=100).contains(&out.quality.value()), "{budget}");
        }
    }

    #[test]
    fn generous_budget_commits_high_quality() {
        let codec = MockCodec::new(100, 100, 10);
        let out = run(&codec, 85, 1_000_000);
        assert!(out.quality.value() >= 99);
        assert!(out.within_budget);
    }

    #[test]
    fn impossible_budget_commits_at_floor() {
        let codec = MockCodec::new(100, 100, 1000);
        let out = run(&codec, 85, 10);
        assert_eq!(out.quality.value(), 5);
        assert!(!out.within_budget);
        assert_eq!(out.bytes.len(), 5000);
    }

    #[test]
    fn non_monotonic_sizes_still_terminate() {
        let codec = MockCodec::with_size_fn(10, 10, |q| if q % 2 == 0 { 10 } else { 10_000 });
        let out = run(&codec, 85, 100);
        assert!(out.iterations <= MAX_SEARCH_ITERATIONS);
        assert!((5..=100).contains(&out.quality.value()));
    }

    #[test]
    fn cancelled_before_first_probe() {
        let codec = MockCodec::new(10, 10, 1000);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = encode_to_target_size(
            &codec,
            &Dimensions::new(10, 10),
            ImageFormat::WebP,
            Quality::new(85),
            1000,
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::Cancelled(0)));
        assert!(codec.encode_qualities().is_empty());
    }

    #[test]
    fn codec_failure_propagates() {
        let codec = MockCodec::new(10, 10, 1000).failing_encode();
        let err = encode_to_target_size(
            &codec,
            &Dimensions::new(10, 10),
            ImageFormat::Jpeg,
            Quality::new(85),
            1000,
            &CancelFlag::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::Codec(_)));
    }

    #[test]
    fn cancel_flag_clones_share_state() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
