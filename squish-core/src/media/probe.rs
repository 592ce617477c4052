// ============================================================================
// squish-core/src/media/probe.rs
// ============================================================================
//
// MEDIA PROBER: Duration, Dimensions and Thumbnails
//
// The prober answers two questions about a staged source before any encode
// attempt is made: what are its duration and native pixel dimensions, and
// what does it look like (a JPEG thumbnail captured at a configurable
// offset). A source the prober cannot read is fatal for the whole call.
//
// The production implementation runs ffprobe (via the ffprobe crate) for
// metadata and ffmpeg (via ffmpeg-sidecar) for the thumbnail capture.

use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use crate::external::spawn_ffmpeg;
use crate::media::source::StagedSource;
use crate::temp_files;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffprobe::{FfProbeError, ffprobe};
use serde::{Deserialize, Serialize};

/// Basic facts about a source, derived once per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Duration in seconds, never negative
    pub duration_secs: f64,
    /// Native width in pixels, never zero
    pub native_width: u32,
    /// Native height in pixels, never zero
    pub native_height: u32,
}

impl MediaMetadata {
    /// Builds metadata, rejecting zero dimensions and negative durations.
    pub fn new(duration_secs: f64, native_width: u32, native_height: u32) -> CoreResult<Self> {
        if native_width == 0 || native_height == 0 {
            return Err(CoreError::MediaDecode(format!(
                "invalid frame dimensions {native_width}x{native_height}"
            )));
        }
        let duration_secs = if duration_secs.is_finite() {
            duration_secs.max(0.0)
        } else {
            0.0
        };
        Ok(Self {
            duration_secs,
            native_width,
            native_height,
        })
    }
}

/// Loads a source's metadata and captures thumbnails.
pub trait MediaProber: Send + Sync {
    /// Reads duration and native dimensions.
    fn probe(&self, source: &StagedSource) -> CoreResult<MediaMetadata>;

    /// Captures one frame at `offset_secs` as a compressed still image.
    /// `offset_secs` is already clamped to the source duration.
    fn thumbnail(&self, source: &StagedSource, offset_secs: f64, quality: f32) -> CoreResult<Vec<u8>>;
}

/// Distance kept from the end of the stream; a seek to the exact duration
/// decodes nothing. One frame at 30 fps.
const END_OF_STREAM_MARGIN_SECS: f64 = 1.0 / 30.0;

/// Offset at which a thumbnail is taken: `min(offset, duration)`, pulled back
/// to the last frame when the offset reaches the end of the stream.
#[must_use]
pub fn thumbnail_offset(requested_secs: f64, metadata: &MediaMetadata) -> f64 {
    let last_frame = (metadata.duration_secs - END_OF_STREAM_MARGIN_SECS).max(0.0);
    requested_secs.max(0.0).min(last_frame)
}

/// Maps a 0.0-1.0 quality onto mjpeg's qscale (2 = best, 31 = worst).
#[must_use]
pub fn jpeg_qscale(quality: f32) -> u8 {
    let quality = quality.clamp(0.0, 1.0);
    (2.0 + (1.0 - quality) * 29.0).round() as u8
}

/// ffprobe / ffmpeg backed prober.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber;

impl FfprobeProber {
    pub fn new() -> Self {
        Self
    }
}

impl MediaProber for FfprobeProber {
    fn probe(&self, source: &StagedSource) -> CoreResult<MediaMetadata> {
        let input_path = source.path();
        log::debug!("Running ffprobe for metadata on: {}", input_path.display());

        let metadata = ffprobe(input_path).map_err(|err| {
            log::error!("ffprobe failed on {}: {:?}", input_path.display(), err);
            map_ffprobe_error(err)
        })?;

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| CoreError::MediaDecode("no video stream found".to_string()))?;

        let width = video_stream.width.unwrap_or(0);
        let height = video_stream.height.unwrap_or(0);
        if width <= 0 || height <= 0 {
            return Err(CoreError::MediaDecode(format!(
                "video stream has unusable dimensions {width}x{height}"
            )));
        }

        // Streamed webm files often carry no container duration; fall back to the stream's.
        let duration_secs = metadata
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .or_else(|| {
                video_stream
                    .duration
                    .as_deref()
                    .and_then(|d| d.parse::<f64>().ok())
            })
            .unwrap_or(0.0);

        MediaMetadata::new(duration_secs, width as u32, height as u32)
    }

    fn thumbnail(&self, source: &StagedSource, offset_secs: f64, quality: f32) -> CoreResult<Vec<u8>> {
        let output_path = temp_files::create_temp_file_path(source.scratch_dir(), "thumbnail", "jpg");

        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.args(["-loglevel", "error", "-y"]);
        cmd.args(["-ss", &format!("{offset_secs:.3}")]);
        cmd.input(source.path().to_string_lossy().as_ref());
        cmd.args(["-frames:v", "1"]);
        cmd.args(["-q:v", &jpeg_qscale(quality).to_string()]);
        cmd.output(output_path.to_string_lossy().as_ref());

        let mut child = spawn_ffmpeg(cmd, "thumbnail")?;
        let status = child
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (thumbnail)", e))?;
        if !status.success() {
            return Err(command_failed_error(
                "ffmpeg (thumbnail)",
                status,
                "thumbnail capture failed",
            ));
        }

        let bytes = std::fs::read(&output_path).map_err(|e| {
            CoreError::MediaDecode(format!("thumbnail was not written: {e}"))
        })?;
        log::debug!("Captured {} byte thumbnail at {:.3}s", bytes.len(), offset_secs);
        Ok(bytes)
    }
}

fn map_ffprobe_error(err: FfProbeError) -> CoreError {
    match err {
        FfProbeError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            CoreError::DependencyNotFound("ffprobe".to_string())
        }
        FfProbeError::Io(io_err) => command_start_error("ffprobe", io_err),
        FfProbeError::Status(output) => CoreError::MediaDecode(format!(
            "ffprobe could not read the source: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )),
        FfProbeError::Deserialize(err) => {
            CoreError::JsonParseError(format!("ffprobe output deserialization: {err}"))
        }
        other => CoreError::MediaDecode(format!("unknown ffprobe error: {other:?}")),
    }
}
