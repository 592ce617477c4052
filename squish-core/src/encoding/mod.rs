//! Encoding side of the engine.
//!
//! This module contains the quality ladder, output dimension resolution, the
//! raster surface the render loop draws into, the encoding sink abstraction
//! and the three encoders built on them: the per-preset Frame Re-encoder, the
//! Progressive Search Controller driving it, and the fixed-settings Fallback
//! Compressor.

pub mod dimensions;
pub mod fallback;
pub mod ladder;
pub mod raster;
pub mod reencoder;
pub mod search;
pub mod sink;

// Re-export commonly used types
pub use dimensions::{ResolvedDimensions, fit_within, resolve};
pub use fallback::simple_compress;
pub use ladder::{LADDER, QualityPreset, QualityTier, levels_for};
pub use raster::{DecodedFrame, FrameSampler, RasterSurface};
pub use reencoder::{AudioPolicy, CompressionAttemptResult, FrameReencoder};
pub use search::{
    AttemptOutcome, AttemptRecord, CompressionStrategy, SearchOutcome, SearchReport,
    compress_to_target, search_ladder,
};
pub use sink::{EncodingSink, SidecarSinkFactory, SinkFactory, SinkProfile, SinkSettings};
