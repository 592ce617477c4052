//! Core library for size-constrained video compression using ffmpeg and ffprobe.
//!
//! This crate takes a source video and a byte budget, searches a ladder of
//! quality presets re-encoding frame by frame until the output fits, and
//! falls back to a fixed-settings encoder when the search cannot run. It also
//! probes basic media metadata and captures thumbnails.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use squish_core::{CancelToken, CompressOptions, Compressor, CoreConfig, QualityTier, SourceMedia};
//! use std::path::Path;
//!
//! let config = CoreConfig::from_env();
//! let compressor = Compressor::with_ffmpeg(config).unwrap();
//!
//! let source = SourceMedia::from_path(Path::new("/path/to/clip.mp4")).unwrap();
//! let options = CompressOptions::new(10.0).max_quality(QualityTier::High);
//!
//! let video = compressor.compress(&source, &options, &CancelToken::new()).unwrap();
//! println!(
//!     "{:.2} MB -> {:.2} MB ({})",
//!     video.result.original_size_mb,
//!     video.result.compressed_size_mb,
//!     video.result.quality_tier
//! );
//! ```

pub mod cancel;
pub mod compressor;
pub mod config;
pub mod encoding;
pub mod error;
pub mod events;
pub mod external;
pub mod media;
pub mod metrics;
pub mod temp_files;
pub mod utils;
pub mod validation;

// Re-exports for public API
pub use cancel::CancelToken;
pub use compressor::{CompressedVideo, Compressor, compress_video};
pub use config::{CompressOptions, CoreConfig, CoreConfigBuilder};
pub use encoding::{
    CompressionAttemptResult, CompressionStrategy, QualityPreset, QualityTier, ResolvedDimensions,
    SearchReport, levels_for, resolve,
};
pub use error::{CoreError, CoreResult};
pub use events::{
    ChannelObserver, CompressionEvent, CompressionObserver, CompressionStatus, EventDispatcher,
    JsonLinesObserver, NullObserver,
};
pub use media::{MediaMetadata, SourceMedia};
pub use metrics::{CompressionResult, ReductionTier, summarize};
pub use utils::{format_bytes, format_duration};
pub use validation::precheck;
