//! Metrics recorder: packages the outcome of a call into a [`CompressionResult`].
//!
//! The tier is a bucket of the compression ratio, not of visual fidelity,
//! hence the type name [`ReductionTier`]. The thresholds are fixed: a ratio
//! under 0.3 is `High`, under 0.6 is `Medium`. The result field keeps the
//! `quality_tier` name callers already consume.

use crate::utils::bytes_to_mb;
use serde::{Deserialize, Serialize};

/// Ratio below which a result is tiered `High`.
pub const HIGH_TIER_MAX_RATIO: f64 = 0.3;

/// Ratio below which a result is tiered `Medium`.
pub const MEDIUM_TIER_MAX_RATIO: f64 = 0.6;

/// Bucket of the achieved size reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionTier {
    High,
    Medium,
    Low,
}

impl ReductionTier {
    /// `< 0.3` is `High`, `< 0.6` is `Medium`, anything else `Low`.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < HIGH_TIER_MAX_RATIO {
            ReductionTier::High
        } else if ratio < MEDIUM_TIER_MAX_RATIO {
            ReductionTier::Medium
        } else {
            ReductionTier::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReductionTier::High => "high",
            ReductionTier::Medium => "medium",
            ReductionTier::Low => "low",
        }
    }
}

impl std::fmt::Display for ReductionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record returned to the caller for one compression call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub original_size_mb: f64,
    pub compressed_size_mb: f64,
    /// `1 - compressed / original`, within `[0, 1)`
    pub compression_ratio: f64,
    pub quality_tier: ReductionTier,
    pub processing_time_ms: u64,
    #[serde(skip)]
    pub thumbnail: Option<Vec<u8>>,
}

impl CompressionResult {
    pub fn processing_time_sec(&self) -> f64 {
        self.processing_time_ms as f64 / 1000.0
    }
}

/// Size reduction ratio, clamped to `[0, 1)`.
///
/// Outputs larger than the source count as no reduction; an empty original
/// yields 0.
pub fn compression_ratio(original_bytes: u64, compressed_bytes: u64) -> f64 {
    if original_bytes == 0 {
        return 0.0;
    }
    let ratio = 1.0 - compressed_bytes as f64 / original_bytes as f64;
    ratio.clamp(0.0, 1.0 - f64::EPSILON)
}

/// Builds the result record. Pure.
pub fn summarize(
    original_bytes: u64,
    compressed_bytes: u64,
    elapsed_ms: u64,
    thumbnail: Option<Vec<u8>>,
) -> CompressionResult {
    let ratio = compression_ratio(original_bytes, compressed_bytes);
    CompressionResult {
        original_size_mb: bytes_to_mb(original_bytes),
        compressed_size_mb: bytes_to_mb(compressed_bytes),
        compression_ratio: ratio,
        quality_tier: ReductionTier::from_ratio(ratio),
        processing_time_ms: elapsed_ms,
        thumbnail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(compression_ratio(10 * MB, 10 * MB), 0.0);
        assert_eq!(compression_ratio(10 * MB, 20 * MB), 0.0);
        assert_eq!(compression_ratio(0, 5), 0.0);
        assert!(compression_ratio(10 * MB, 0) < 1.0);
        assert!((compression_ratio(50 * MB, 10 * MB) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(ReductionTier::from_ratio(0.0), ReductionTier::High);
        assert_eq!(ReductionTier::from_ratio(0.29), ReductionTier::High);
        assert_eq!(ReductionTier::from_ratio(0.3), ReductionTier::Medium);
        assert_eq!(ReductionTier::from_ratio(0.59), ReductionTier::Medium);
        assert_eq!(ReductionTier::from_ratio(0.6), ReductionTier::Low);
        assert_eq!(ReductionTier::from_ratio(0.95), ReductionTier::Low);
    }

    #[test]
    fn test_summarize_passthrough() {
        let result = summarize(8 * MB, 8 * MB, 12, None);
        assert_eq!(result.original_size_mb, 8.0);
        assert_eq!(result.compressed_size_mb, result.original_size_mb);
        assert_eq!(result.compression_ratio, 0.0);
        assert_eq!(result.quality_tier, ReductionTier::High);
        assert_eq!(result.processing_time_ms, 12);
    }

    #[test]
    fn test_result_serializes_without_thumbnail() {
        let result = summarize(50 * MB, 10 * MB, 1500, Some(vec![0xFF, 0xD8]));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["quality_tier"], "low");
        assert_eq!(value["processing_time_ms"], 1500);
        assert!(value.get("thumbnail").is_none());
    }
}
