// ============================================================================
// squish-core/src/media/decode.rs
// ============================================================================
//
// DECODE HANDLE: Continuous Playback and Single-Frame Capture
//
// The Frame Re-encoder consumes a source as an explicit iterator of decoded,
// timestamped frames. Pulling the next frame is the only place the render
// loop waits, and the iterator ending is the only termination signal.
//
// Two access modes are offered:
// - open_playback: continuous decoding of the whole source
// - frame_at: seek to one timestamp and decode a single frame (used when
//   playback cannot be started and by the Fallback Compressor's
//   time-stepped capture loop)
//
// SidecarDecoder implements both with ffmpeg-sidecar, asking ffmpeg to scale
// to the requested dimensions and emit raw rgb24.

use crate::encoding::dimensions::ResolvedDimensions;
use crate::encoding::raster::DecodedFrame;
use crate::error::{CoreError, CoreResult};
use crate::external::spawn_ffmpeg;
use crate::media::source::StagedSource;

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;

/// Source of decoded frames for one compression call.
pub trait MediaDecoder: Send + Sync {
    /// Iterator over frames in presentation order.
    type Playback: Iterator<Item = CoreResult<DecodedFrame>>;

    /// Starts continuous playback, scaled to `dims`.
    ///
    /// Fails with [`CoreError::PlaybackBlocked`] when playback cannot be
    /// started; the caller may still capture single frames.
    fn open_playback(
        &self,
        source: &StagedSource,
        dims: ResolvedDimensions,
    ) -> CoreResult<Self::Playback>;

    /// Seeks to `timestamp` and decodes one frame, scaled to `dims`.
    fn frame_at(
        &self,
        source: &StagedSource,
        timestamp: f64,
        dims: ResolvedDimensions,
    ) -> CoreResult<DecodedFrame>;
}

/// ffmpeg backed decoder.
#[derive(Debug, Clone, Default)]
pub struct SidecarDecoder;

impl SidecarDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn rawvideo_command(source: &StagedSource, seek: Option<f64>, dims: ResolvedDimensions) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner();
    if let Some(ts) = seek {
        cmd.args(["-ss", &format!("{ts:.3}")]);
    }
    cmd.input(source.path().to_string_lossy().as_ref());
    cmd.args(["-an", "-sn"]);
    cmd.args(["-vf", &format!("scale={}:{}:flags=bilinear", dims.width, dims.height)]);
    cmd
}

impl MediaDecoder for SidecarDecoder {
    type Playback = SidecarPlayback;

    fn open_playback(
        &self,
        source: &StagedSource,
        dims: ResolvedDimensions,
    ) -> CoreResult<Self::Playback> {
        let mut cmd = rawvideo_command(source, None, dims);
        cmd.rawvideo();

        let mut child = match spawn_ffmpeg(cmd, "playback") {
            Ok(child) => child,
            Err(CoreError::DependencyNotFound(tool)) => {
                return Err(CoreError::PlaybackBlocked(format!("{tool} is not installed")));
            }
            Err(e) => return Err(CoreError::PlaybackBlocked(e.to_string())),
        };
        let events = match child.iter() {
            Ok(events) => events,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoreError::PlaybackBlocked(format!(
                    "could not attach to decoder output: {e}"
                )));
            }
        };

        Ok(SidecarPlayback {
            child,
            events,
            frames_yielded: 0,
            last_error: None,
            finished: false,
        })
    }

    fn frame_at(
        &self,
        source: &StagedSource,
        timestamp: f64,
        dims: ResolvedDimensions,
    ) -> CoreResult<DecodedFrame> {
        let mut cmd = rawvideo_command(source, Some(timestamp), dims);
        cmd.args(["-frames:v", "1"]);
        cmd.rawvideo();

        let mut child = spawn_ffmpeg(cmd, "still frame")?;
        let events = child
            .iter()
            .map_err(|e| CoreError::MediaDecode(format!("could not attach to decoder output: {e}")))?;

        let mut frame = None;
        let mut last_error = None;
        for event in events {
            match event {
                FfmpegEvent::OutputFrame(out) if frame.is_none() => {
                    frame = Some(DecodedFrame::new(out.width, out.height, timestamp, out.data));
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) | FfmpegEvent::Error(line) => {
                    last_error = Some(line);
                }
                _ => {}
            }
        }
        let _ = child.wait();

        frame.unwrap_or_else(|| {
            Err(CoreError::MediaDecode(format!(
                "no frame decoded at {timestamp:.3}s{}",
                last_error.map(|e| format!(": {e}")).unwrap_or_default()
            )))
        })
    }
}

/// Continuous playback through a running ffmpeg process.
///
/// The process is killed when the iterator is dropped before the end of the
/// stream.
pub struct SidecarPlayback {
    child: FfmpegChild,
    events: FfmpegIterator,
    frames_yielded: u64,
    last_error: Option<String>,
    finished: bool,
}

impl SidecarPlayback {
    fn finish(&mut self) -> Option<CoreResult<DecodedFrame>> {
        self.finished = true;
        let status = self.child.wait();
        if self.frames_yielded > 0 {
            return None;
        }
        let detail = self
            .last_error
            .take()
            .unwrap_or_else(|| "decoder produced no frames".to_string());
        match status {
            Ok(status) if status.success() => None,
            Ok(status) => Some(Err(CoreError::PlaybackBlocked(format!("{detail} ({status})")))),
            Err(e) => Some(Err(CoreError::PlaybackBlocked(format!("{detail}: {e}")))),
        }
    }
}

impl Iterator for SidecarPlayback {
    type Item = CoreResult<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.events.next() {
                Some(FfmpegEvent::OutputFrame(out)) => {
                    self.frames_yielded += 1;
                    return Some(DecodedFrame::new(
                        out.width,
                        out.height,
                        f64::from(out.timestamp),
                        out.data,
                    ));
                }
                Some(FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line))
                | Some(FfmpegEvent::Error(line)) => {
                    log::debug!("decoder: {}", line);
                    self.last_error = Some(line);
                }
                Some(FfmpegEvent::Done) | None => return self.finish(),
                Some(_) => {}
            }
        }
    }
}

impl Drop for SidecarPlayback {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
