// ============================================================================
// squish-core/src/encoding/reencoder.rs
// ============================================================================
//
// FRAME RE-ENCODER: One Encode Attempt at One Preset
//
// An attempt pulls decoded frames from the decoder, draws each into an
// off-screen raster surface at the resolved dimensions and writes the surface
// into an encoding sink at the preset's frame rate. The decoder side is
// uncapped; the FrameSampler decides how many constant-rate output slots each
// frame fills.
//
// RENDER LOOP:
// 1. Open the sink, then start playback
// 2. For every frame: hold the previous surface for the slots that elapsed,
//    draw the new frame, write it for the slots it owns
// 3. At stream end, hold the last frame until the source duration
// 4. Finish the sink and collect its output
//
// When playback cannot be started (or yields no frames), one still frame at
// t=0 is captured and the attempt finalises immediately. Such an output is a
// near-still image and the result is flagged `degraded`.
//
// The sink, the playback handle and the surface are owned by the attempt and
// released on every exit path, including errors and cancellation. Decode
// failures after the probe count against the attempt (Encode), not the call.

use crate::cancel::CancelToken;
use crate::encoding::dimensions::ResolvedDimensions;
use crate::encoding::ladder::QualityPreset;
use crate::encoding::raster::{FrameSampler, RasterSurface};
use crate::encoding::sink::{EncodingSink, SinkFactory, SinkProfile, SinkSettings};
use crate::error::{CoreError, CoreResult};
use crate::media::decode::MediaDecoder;
use crate::media::probe::MediaMetadata;
use crate::media::source::StagedSource;

/// Output of one encode attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionAttemptResult {
    pub output_bytes: Vec<u8>,
    pub size_bytes: u64,
    /// `None` when the source was passed through without re-encoding
    pub preset_used: Option<QualityPreset>,
    pub dims: Option<ResolvedDimensions>,
    /// Frames written to the sink
    pub frames_written: u64,
    /// True when playback was unavailable and only a still frame was encoded
    pub degraded: bool,
}

impl CompressionAttemptResult {
    /// Wraps the source bytes unchanged.
    pub fn passthrough(bytes: Vec<u8>) -> Self {
        Self {
            size_bytes: bytes.len() as u64,
            output_bytes: bytes,
            preset_used: None,
            dims: None,
            frames_written: 0,
            degraded: false,
        }
    }
}

/// Audio handling for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioPolicy {
    pub include: bool,
    pub bitrate_kbps: u32,
}

/// Runs encode attempts with a decoder and a sink factory.
pub struct FrameReencoder<'a, D, F> {
    decoder: &'a D,
    sinks: &'a F,
    audio: AudioPolicy,
}

impl<'a, D: MediaDecoder, F: SinkFactory> FrameReencoder<'a, D, F> {
    pub fn new(decoder: &'a D, sinks: &'a F, audio: AudioPolicy) -> Self {
        Self { decoder, sinks, audio }
    }

    pub fn decoder(&self) -> &'a D {
        self.decoder
    }

    pub fn sinks(&self) -> &'a F {
        self.sinks
    }

    pub fn audio(&self) -> AudioPolicy {
        self.audio
    }

    /// Encodes the whole source with `preset` at `dims`.
    pub fn encode(
        &self,
        source: &StagedSource,
        metadata: &MediaMetadata,
        dims: ResolvedDimensions,
        preset: &QualityPreset,
        cancel: &CancelToken,
    ) -> CoreResult<CompressionAttemptResult> {
        cancel.check()?;

        let settings = SinkSettings {
            dims,
            frame_rate: preset.frame_rate,
            bitrate_kbps: preset.bitrate_kbps,
            profile: SinkProfile::Standard,
            audio_source: self.audio.include.then(|| source.path().to_path_buf()),
            audio_bitrate_kbps: self.audio.bitrate_kbps,
        };
        let mut sink = self.sinks.open(&settings)?;
        let mut surface = RasterSurface::new(dims);
        let mut sampler = FrameSampler::new(preset.frame_rate);
        let mut frames_written = 0u64;

        match self.decoder.open_playback(source, dims) {
            Ok(playback) => {
                for frame in playback {
                    cancel.check()?;
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(CoreError::PlaybackBlocked(reason)) if !surface.has_content() => {
                            log::warn!("Playback stopped before the first frame: {}", reason);
                            break;
                        }
                        Err(e) => return Err(within_attempt(e)),
                    };

                    // Slots before the first frame show the first frame.
                    let elapsed = sampler.slots_before(frame.timestamp);
                    let held = if surface.has_content() { elapsed } else { 0 };
                    write_copies(&mut sink, &surface, held)?;

                    surface.draw(&frame);
                    let owned = (elapsed - held) + sampler.slots_at(frame.timestamp);
                    write_copies(&mut sink, &surface, owned)?;
                    frames_written += held + owned;
                }
            }
            Err(CoreError::PlaybackBlocked(reason)) => {
                log::warn!("Playback blocked: {}", reason);
            }
            Err(e) => return Err(within_attempt(e)),
        }
        cancel.check()?;

        let degraded = !surface.has_content();
        if degraded {
            log::warn!(
                "No frames from continuous playback; encoding a single still frame at {} ({})",
                dims,
                preset.name
            );
            let still = self
                .decoder
                .frame_at(source, 0.0, dims)
                .map_err(within_attempt)?;
            surface.draw(&still);
            write_copies(&mut sink, &surface, 1)?;
            frames_written += 1;
        } else {
            let held = sampler.slots_until(metadata.duration_secs);
            write_copies(&mut sink, &surface, held)?;
            frames_written += held;
            if frames_written == 0 {
                write_copies(&mut sink, &surface, 1)?;
                frames_written = 1;
            }
        }

        let output_bytes = sink.finish()?;
        log::debug!(
            "Attempt {} at {} wrote {} frames, {} bytes",
            preset.name,
            dims,
            frames_written,
            output_bytes.len()
        );

        Ok(CompressionAttemptResult {
            size_bytes: output_bytes.len() as u64,
            output_bytes,
            preset_used: Some(*preset),
            dims: Some(dims),
            frames_written,
            degraded,
        })
    }
}

/// Decode failures after a successful probe are per-attempt Encode errors.
fn within_attempt(err: CoreError) -> CoreError {
    match err {
        CoreError::MediaDecode(msg) => CoreError::Encode(format!("decode failed mid-attempt: {msg}")),
        other => other,
    }
}

/// Writes the surface `count` times.
pub(crate) fn write_copies<S: EncodingSink>(
    sink: &mut S,
    surface: &RasterSurface,
    count: u64,
) -> CoreResult<()> {
    for _ in 0..count {
        sink.write_frame(surface)?;
    }
    Ok(())
}
