// ============================================================================
// squish-core/src/encoding/fallback.rs
// ============================================================================
//
// FALLBACK COMPRESSOR: Fixed Settings, Time-Stepped Capture
//
// Runs only after the progressive search failed outright (for example when
// no H.264 encoder is available). It trades speed and quality for robustness:
//
// - output fits inside a small fixed box, never upscaled
// - bitrate is a fixed cap, lowered further when the budget demands it
// - frames are captured by explicit seeks at a low fixed rate instead of
//   continuous playback
// - the always-available Conservative sink profile is used
//
// A failure here is terminal for the call; the engine wraps it together with
// the search error in CompressionFailed.

use crate::cancel::CancelToken;
use crate::config::FallbackSettings;
use crate::encoding::dimensions;
use crate::encoding::ladder::{QualityPreset, QualityTier};
use crate::encoding::raster::RasterSurface;
use crate::encoding::reencoder::{AudioPolicy, CompressionAttemptResult};
use crate::encoding::sink::{EncodingSink, SinkFactory, SinkProfile, SinkSettings};
use crate::error::{CoreError, CoreResult};
use crate::media::decode::MediaDecoder;
use crate::media::probe::MediaMetadata;
use crate::media::source::StagedSource;
use crate::utils::budget_bitrate_kbps;

/// Lowest video bitrate the fallback will request.
pub const MIN_FALLBACK_BITRATE_KBPS: u32 = 64;

/// Share of the byte budget given to the stream; the rest is container overhead.
const BUDGET_HEADROOM: f64 = 0.9;

/// Video bitrate for the fallback encode.
///
/// `min(settings cap, 90% of the budget bitrate minus audio)`, never below
/// [`MIN_FALLBACK_BITRATE_KBPS`]. Unknown durations use the cap.
pub fn fallback_bitrate_kbps(
    settings: &FallbackSettings,
    target_size_bytes: u64,
    duration_secs: f64,
    audio: AudioPolicy,
) -> u32 {
    let cap = settings.bitrate_kbps.max(MIN_FALLBACK_BITRATE_KBPS);
    let Some(budget) = budget_bitrate_kbps(target_size_bytes, duration_secs) else {
        return cap;
    };
    let audio_kbps = if audio.include { audio.bitrate_kbps } else { 0 };
    let video_budget = (f64::from(budget) * BUDGET_HEADROOM) as u32;
    video_budget
        .saturating_sub(audio_kbps)
        .clamp(MIN_FALLBACK_BITRATE_KBPS, cap)
}

/// Number of frames captured: one per `1 / fps` seconds, at least one.
pub fn capture_count(duration_secs: f64, frame_rate: u32) -> u64 {
    let frames = (duration_secs.max(0.0) * f64::from(frame_rate.max(1))).ceil();
    (frames as u64).max(1)
}

/// Compresses the source with the fixed fallback settings.
#[allow(clippy::too_many_arguments)]
pub fn simple_compress<D: MediaDecoder, F: SinkFactory>(
    decoder: &D,
    sinks: &F,
    staged: &StagedSource,
    metadata: &MediaMetadata,
    target_size_bytes: u64,
    settings: &FallbackSettings,
    audio: AudioPolicy,
    cancel: &CancelToken,
) -> CoreResult<CompressionAttemptResult> {
    cancel.check()?;

    let dims = dimensions::fit_within(
        metadata.native_width,
        metadata.native_height,
        settings.max_width,
        settings.max_height,
    );
    let frame_rate = settings.frame_rate.max(1);
    let bitrate_kbps = fallback_bitrate_kbps(settings, target_size_bytes, metadata.duration_secs, audio);
    let total = capture_count(metadata.duration_secs, frame_rate);

    log::warn!(
        "Running fallback compressor: {} @ {} fps, {} kbps, {} frames",
        dims,
        frame_rate,
        bitrate_kbps,
        total
    );

    let sink_settings = SinkSettings {
        dims,
        frame_rate,
        bitrate_kbps,
        profile: SinkProfile::Conservative,
        audio_source: audio.include.then(|| staged.path().to_path_buf()),
        audio_bitrate_kbps: audio.bitrate_kbps,
    };
    let mut sink = sinks.open(&sink_settings)?;
    let mut surface = RasterSurface::new(dims);

    for i in 0..total {
        cancel.check()?;
        let timestamp = i as f64 / f64::from(frame_rate);
        match decoder.frame_at(staged, timestamp, dims) {
            Ok(frame) => surface.draw(&frame),
            // Seeks close to the end may land past the last decodable frame.
            Err(CoreError::MediaDecode(reason)) if surface.has_content() => {
                log::debug!("Holding previous frame at {:.3}s: {}", timestamp, reason);
            }
            Err(e) => return Err(e),
        }
        sink.write_frame(&surface)?;
    }

    let output_bytes = sink.finish()?;
    log::info!("Fallback produced {} bytes", output_bytes.len());

    Ok(CompressionAttemptResult {
        size_bytes: output_bytes.len() as u64,
        output_bytes,
        preset_used: Some(QualityPreset {
            name: QualityTier::Minimum,
            scale: f64::from(dims.width) / f64::from(metadata.native_width.max(1)),
            frame_rate,
            bitrate_kbps,
        }),
        dims: Some(dims),
        frames_written: total,
        degraded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_AUDIO: AudioPolicy = AudioPolicy { include: false, bitrate_kbps: 64 };

    #[test]
    fn test_bitrate_uses_cap_when_budget_is_generous() {
        let settings = FallbackSettings::default();
        // 10 MB over 10 s is ~8 Mbps
        assert_eq!(fallback_bitrate_kbps(&settings, 10 * 1024 * 1024, 10.0, NO_AUDIO), 400);
    }

    #[test]
    fn test_bitrate_follows_tight_budget() {
        let settings = FallbackSettings::default();
        // 1 MB over 60 s: 139 kbps budget, 90% = 125
        assert_eq!(fallback_bitrate_kbps(&settings, 1024 * 1024, 60.0, NO_AUDIO), 125);

        let audio = AudioPolicy { include: true, bitrate_kbps: 32 };
        assert_eq!(fallback_bitrate_kbps(&settings, 1024 * 1024, 60.0, audio), 93);
    }

    #[test]
    fn test_bitrate_floor_and_unknown_duration() {
        let settings = FallbackSettings::default();
        assert_eq!(fallback_bitrate_kbps(&settings, 1024, 600.0, NO_AUDIO), MIN_FALLBACK_BITRATE_KBPS);
        assert_eq!(fallback_bitrate_kbps(&settings, 1024, 0.0, NO_AUDIO), 400);
    }

    #[test]
    fn test_capture_count() {
        assert_eq!(capture_count(10.0, 5), 50);
        assert_eq!(capture_count(10.1, 5), 51);
        assert_eq!(capture_count(0.0, 5), 1);
        assert_eq!(capture_count(0.05, 5), 1);
    }
}
