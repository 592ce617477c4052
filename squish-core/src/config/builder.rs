// ============================================================================
// squish-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for overriding individual engine settings while
// keeping the defaults for everything else.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{CoreConfig, FallbackSettings};

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use squish_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .temp_dir("/tmp/squish".into())
///     .audio_bitrate_kbps(96)
///     .fallback_frame_rate(4)
///     .build();
/// assert_eq!(config.audio_bitrate_kbps, 96);
/// assert_eq!(config.fallback.frame_rate, 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration instead of the defaults.
    pub fn from_config(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Sets the directory for staged sources and scratch files.
    pub fn temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.config.temp_dir = Some(temp_dir);
        self
    }

    /// Sets the thumbnail capture offset in seconds.
    pub fn thumbnail_offset_secs(mut self, offset: f64) -> Self {
        self.config.thumbnail_offset_secs = offset;
        self
    }

    /// Sets the thumbnail still-image quality (0.0-1.0).
    pub fn thumbnail_quality(mut self, quality: f32) -> Self {
        self.config.thumbnail_quality = quality;
        self
    }

    /// Sets whether the source's audio is carried into the output.
    pub fn include_audio(mut self, include: bool) -> Self {
        self.config.include_audio = include;
        self
    }

    pub fn audio_bitrate_kbps(mut self, kbps: u32) -> Self {
        self.config.audio_bitrate_kbps = kbps;
        self
    }

    /// Sets the hard ceiling on accepted source sizes.
    pub fn max_source_bytes(mut self, bytes: u64) -> Self {
        self.config.max_source_bytes = bytes;
        self
    }

    /// Replaces the fallback compressor settings wholesale.
    pub fn fallback(mut self, fallback: FallbackSettings) -> Self {
        self.config.fallback = fallback;
        self
    }

    pub fn fallback_frame_rate(mut self, fps: u32) -> Self {
        self.config.fallback.frame_rate = fps;
        self
    }

    pub fn fallback_bitrate_kbps(mut self, kbps: u32) -> Self {
        self.config.fallback.bitrate_kbps = kbps;
        self
    }

    /// Builds the CoreConfig. Call [`CoreConfig::validate`] before use.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
