//! Media access: source staging, probing and decoding.
//!
//! Everything that reads the source video lives here. Encoding-side types
//! live in [`crate::encoding`].

pub mod decode;
pub mod probe;
pub mod source;

// Re-export commonly used types
pub use decode::{MediaDecoder, SidecarDecoder};
pub use probe::{FfprobeProber, MediaMetadata, MediaProber};
pub use source::{SourceMedia, StagedSource};
