//! Configuration structures and constants for the squish-core library.
//!
//! Two layers of configuration exist:
//!
//! - [`CoreConfig`]: engine-wide settings shared by every compression call a
//!   [`crate::Compressor`] performs (scratch directory, thumbnail capture,
//!   audio handling, fallback settings, source size ceiling).
//! - [`CompressOptions`]: the per-call input contract (target size, quality
//!   ceiling, thumbnail request).

mod builder;
pub mod utils;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoding::ladder::QualityTier;
use crate::error::{CoreError, CoreResult};

pub use builder::CoreConfigBuilder;

// Default constants

/// Seconds into the source at which the thumbnail frame is captured.
/// Clamped to the source duration at capture time.
pub const DEFAULT_THUMBNAIL_OFFSET_SECS: f64 = 1.0;

/// Still-image quality for thumbnails, on a 0.0-1.0 scale.
pub const DEFAULT_THUMBNAIL_QUALITY: f32 = 0.8;

/// Audio bitrate used when the source's audio is carried into the output.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 64;

/// Hard ceiling on accepted source files (2 GiB).
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Default output budget for callers that do not specify one.
pub const DEFAULT_TARGET_SIZE_MB: f64 = 10.0;

/// Fallback compressor: maximum output width.
pub const DEFAULT_FALLBACK_MAX_WIDTH: u32 = 640;

/// Fallback compressor: maximum output height.
pub const DEFAULT_FALLBACK_MAX_HEIGHT: u32 = 360;

/// Fallback compressor: capture rate of the time-stepped loop.
pub const DEFAULT_FALLBACK_FRAME_RATE: u32 = 5;

/// Fallback compressor: upper bound on the output bitrate.
pub const DEFAULT_FALLBACK_BITRATE_KBPS: u32 = 400;

/// Fixed settings used by the fallback compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Maximum output width in pixels
    pub max_width: u32,

    /// Maximum output height in pixels
    pub max_height: u32,

    /// Frames captured per second of source
    pub frame_rate: u32,

    /// Upper bound on the output bitrate in kbps
    pub bitrate_kbps: u32,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_FALLBACK_MAX_WIDTH,
            max_height: DEFAULT_FALLBACK_MAX_HEIGHT,
            frame_rate: DEFAULT_FALLBACK_FRAME_RATE,
            bitrate_kbps: DEFAULT_FALLBACK_BITRATE_KBPS,
        }
    }
}

/// Engine-wide configuration.
///
/// All fields have sensible defaults. The builder provides a convenient way
/// to override individual values, and [`CoreConfig::from_env`] applies
/// `SQUISH_*` environment overrides on top of the defaults.
///
/// # Examples
///
/// ```rust
/// use squish_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .thumbnail_offset_secs(2.5)
///     .include_audio(false)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Directory for staged sources and scratch files (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,

    /// Seconds into the source at which the thumbnail is captured
    pub thumbnail_offset_secs: f64,

    /// Thumbnail still-image quality (0.0-1.0)
    pub thumbnail_quality: f32,

    /// Whether the source's audio track is re-encoded into the output
    pub include_audio: bool,

    /// Audio bitrate in kbps when `include_audio` is set
    pub audio_bitrate_kbps: u32,

    /// Sources larger than this are rejected
    pub max_source_bytes: u64,

    /// Settings of the fixed-settings fallback compressor
    pub fallback: FallbackSettings,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            thumbnail_offset_secs: DEFAULT_THUMBNAIL_OFFSET_SECS,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            include_audio: true,
            audio_bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            fallback: FallbackSettings::default(),
        }
    }
}

impl CoreConfig {
    /// Builds a configuration from defaults plus `SQUISH_*` environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temp_dir: std::env::var("SQUISH_TEMP_DIR").ok().map(PathBuf::from),
            thumbnail_offset_secs: utils::get_env_f64(
                "SQUISH_THUMBNAIL_OFFSET",
                defaults.thumbnail_offset_secs,
            ),
            thumbnail_quality: defaults.thumbnail_quality,
            include_audio: utils::get_env_bool("SQUISH_INCLUDE_AUDIO", defaults.include_audio),
            audio_bitrate_kbps: utils::get_env_u32(
                "SQUISH_AUDIO_BITRATE",
                defaults.audio_bitrate_kbps,
            ),
            max_source_bytes: defaults.max_source_bytes,
            fallback: FallbackSettings {
                frame_rate: utils::get_env_u32(
                    "SQUISH_FALLBACK_FPS",
                    defaults.fallback.frame_rate,
                ),
                bitrate_kbps: utils::get_env_u32(
                    "SQUISH_FALLBACK_BITRATE",
                    defaults.fallback.bitrate_kbps,
                ),
                ..defaults.fallback
            },
        }
    }

    /// Checks that every value is within its usable range.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.thumbnail_offset_secs.is_finite() || self.thumbnail_offset_secs < 0.0 {
            return Err(CoreError::Config(format!(
                "thumbnail offset must be a non-negative number of seconds, got {}",
                self.thumbnail_offset_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.thumbnail_quality) {
            return Err(CoreError::Config(format!(
                "thumbnail quality must be within 0.0-1.0, got {}",
                self.thumbnail_quality
            )));
        }
        if self.include_audio && self.audio_bitrate_kbps == 0 {
            return Err(CoreError::Config(
                "audio bitrate must be positive when audio is included".to_string(),
            ));
        }
        if self.max_source_bytes == 0 {
            return Err(CoreError::Config(
                "maximum source size must be positive".to_string(),
            ));
        }
        let fb = &self.fallback;
        if fb.max_width < 2 || fb.max_height < 2 {
            return Err(CoreError::Config(format!(
                "fallback dimensions too small: {}x{}",
                fb.max_width, fb.max_height
            )));
        }
        if fb.frame_rate == 0 || fb.bitrate_kbps == 0 {
            return Err(CoreError::Config(
                "fallback frame rate and bitrate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-call options: the caller-facing input contract of a compression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressOptions {
    /// Output budget in megabytes
    pub target_size_mb: f64,

    /// Highest preset the search may use
    pub max_quality: QualityTier,

    /// Whether to capture a thumbnail of the source
    pub generate_thumbnail: bool,

    /// Identifier reported in lifecycle events (generated when unset)
    pub video_id: Option<String>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            target_size_mb: DEFAULT_TARGET_SIZE_MB,
            max_quality: QualityTier::High,
            generate_thumbnail: true,
            video_id: None,
        }
    }
}

impl CompressOptions {
    pub fn new(target_size_mb: f64) -> Self {
        Self {
            target_size_mb,
            ..Default::default()
        }
    }

    pub fn max_quality(mut self, tier: QualityTier) -> Self {
        self.max_quality = tier;
        self
    }

    pub fn generate_thumbnail(mut self, enable: bool) -> Self {
        self.generate_thumbnail = enable;
        self
    }

    pub fn video_id(mut self, id: impl Into<String>) -> Self {
        self.video_id = Some(id.into());
        self
    }

    /// The budget in bytes.
    #[must_use]
    pub fn target_size_bytes(&self) -> u64 {
        crate::utils::mb_to_bytes(self.target_size_mb)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.target_size_mb.is_finite() || self.target_size_mb <= 0.0 {
            return Err(CoreError::Config(format!(
                "target size must be a positive number of megabytes, got {}",
                self.target_size_mb
            )));
        }
        Ok(())
    }
}
