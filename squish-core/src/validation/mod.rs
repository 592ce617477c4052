//! Validation pre-check
//!
//! Responsibilities:
//! - Reject sources whose declared MIME type is not a video type
//! - Reject sources above the hard size ceiling
//! - Tell callers when a source is already under the target size
//!
//! Callers run [`precheck`] before handing a source to the engine. The engine
//! itself repeats the first two checks; a source under the target is not an
//! error for the engine (it is passed through unchanged).

use crate::config::CompressOptions;
use crate::error::{CoreError, CoreResult};
use crate::media::source::SourceMedia;

/// Fails unless `mime_type` names a video type (`video/*`).
pub fn check_media_type(mime_type: &str) -> CoreResult<()> {
    let is_video = mime_type
        .trim()
        .split_once('/')
        .is_some_and(|(kind, sub)| kind.eq_ignore_ascii_case("video") && !sub.is_empty());
    if is_video {
        Ok(())
    } else {
        Err(CoreError::UnsupportedMediaType(mime_type.to_string()))
    }
}

/// Fails when `size` exceeds `limit`.
pub fn check_size_ceiling(size: u64, limit: u64) -> CoreResult<()> {
    if size > limit {
        Err(CoreError::FileTooLarge { size, limit })
    } else {
        Ok(())
    }
}

/// Fails with [`CoreError::AlreadyUnderTarget`] when no compression is needed.
pub fn check_needs_compression(size: u64, target: u64) -> CoreResult<()> {
    if size <= target {
        Err(CoreError::AlreadyUnderTarget { size, target })
    } else {
        Ok(())
    }
}

/// Runs every pre-check against `source`.
pub fn precheck(source: &SourceMedia, options: &CompressOptions, max_source_bytes: u64) -> CoreResult<()> {
    options.validate()?;
    check_media_type(source.mime_type())?;
    check_size_ceiling(source.size(), max_source_bytes)?;
    check_needs_compression(source.size(), options.target_size_bytes())?;
    log::debug!(
        "Pre-check passed: {} bytes of {}",
        source.size(),
        source.mime_type()
    );
    Ok(())
}
