// ============================================================================
// squish-core/tests/common/mod.rs
// ============================================================================
//
// Shared in-memory implementations of the prober, decoder and sink factory
// used by the integration tests. Nothing here touches ffmpeg.

#![allow(dead_code)]

use squish_core::encoding::dimensions::ResolvedDimensions;
use squish_core::encoding::raster::{DecodedFrame, RasterSurface};
use squish_core::encoding::sink::{EncodingSink, SinkFactory, SinkProfile, SinkSettings};
use squish_core::media::decode::MediaDecoder;
use squish_core::media::probe::{MediaMetadata, MediaProber};
use squish_core::media::source::StagedSource;
use squish_core::{CancelToken, CoreError, CoreResult};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MB: u64 = 1024 * 1024;

// ---- Prober ----

#[derive(Debug, Clone)]
pub struct MockProber {
    pub metadata: MediaMetadata,
    pub fail_probe: bool,
    pub fail_thumbnail: bool,
}

impl MockProber {
    pub fn new(duration_secs: f64, width: u32, height: u32) -> Self {
        Self {
            metadata: MediaMetadata {
                duration_secs,
                native_width: width,
                native_height: height,
            },
            fail_probe: false,
            fail_thumbnail: false,
        }
    }
}

impl MediaProber for MockProber {
    fn probe(&self, _source: &StagedSource) -> CoreResult<MediaMetadata> {
        if self.fail_probe {
            return Err(CoreError::MediaDecode("moov atom not found".to_string()));
        }
        Ok(self.metadata)
    }

    fn thumbnail(&self, _source: &StagedSource, offset_secs: f64, _quality: f32) -> CoreResult<Vec<u8>> {
        if self.fail_thumbnail {
            return Err(CoreError::MediaDecode(format!("no frame at {offset_secs}")));
        }
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }
}

// ---- Decoder ----

/// Error a playback yields in place of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackFault {
    Blocked,
    Decode,
    Encode,
}

impl PlaybackFault {
    fn to_error(self, index: usize) -> CoreError {
        match self {
            PlaybackFault::Blocked => CoreError::PlaybackBlocked("autoplay disabled".to_string()),
            PlaybackFault::Decode => CoreError::MediaDecode(format!("corrupt packet at frame {index}")),
            PlaybackFault::Encode => CoreError::Encode(format!("surface lost at frame {index}")),
        }
    }
}

/// Decoder producing solid frames at a fixed source rate.
#[derive(Debug, Default)]
pub struct MockDecoder {
    pub frame_count: usize,
    pub source_fps: f64,
    pub playback_blocked: bool,
    /// Replaces frame `.0` of every playback with an error
    pub fault: Option<(usize, PlaybackFault)>,
    /// Cancels the token once this many frames have been handed out
    pub cancel_after: Option<(usize, CancelToken)>,
    pub frame_at_fails: bool,
    pub frame_at_calls: AtomicUsize,
    pub playback_calls: AtomicUsize,
    pub playback_drops: Arc<AtomicUsize>,
}

impl MockDecoder {
    pub fn new(frame_count: usize, source_fps: f64) -> Self {
        Self {
            frame_count,
            source_fps,
            ..Default::default()
        }
    }

    pub fn blocked() -> Self {
        Self {
            playback_blocked: true,
            ..Default::default()
        }
    }

    pub fn with_fault(mut self, index: usize, fault: PlaybackFault) -> Self {
        self.fault = Some((index, fault));
        self
    }

    pub fn cancelling_after(mut self, frames: usize, cancel: CancelToken) -> Self {
        self.cancel_after = Some((frames, cancel));
        self
    }

    pub fn drops(&self) -> usize {
        self.playback_drops.load(Ordering::SeqCst)
    }
}

/// Playback handle that counts its own release.
pub struct MockPlayback {
    frames: std::vec::IntoIter<CoreResult<DecodedFrame>>,
    handed_out: usize,
    cancel_after: Option<(usize, CancelToken)>,
    drops: Arc<AtomicUsize>,
}

impl Iterator for MockPlayback {
    type Item = CoreResult<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((after, cancel)) = &self.cancel_after {
            if self.handed_out == *after {
                cancel.cancel();
            }
        }
        self.handed_out += 1;
        self.frames.next()
    }
}

impl Drop for MockPlayback {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl MediaDecoder for MockDecoder {
    type Playback = MockPlayback;

    fn open_playback(&self, _source: &StagedSource, dims: ResolvedDimensions) -> CoreResult<Self::Playback> {
        self.playback_calls.fetch_add(1, Ordering::SeqCst);
        if self.playback_blocked {
            return Err(CoreError::PlaybackBlocked("autoplay disabled".to_string()));
        }
        let frames: Vec<CoreResult<DecodedFrame>> = (0..self.frame_count)
            .map(|i| match self.fault {
                Some((at, fault)) if at == i => Err(fault.to_error(i)),
                _ => {
                    let shade = (i % 256) as u8;
                    Ok(DecodedFrame::solid(
                        dims.width,
                        dims.height,
                        i as f64 / self.source_fps,
                        [shade, shade, shade],
                    ))
                }
            })
            .collect();
        Ok(MockPlayback {
            frames: frames.into_iter(),
            handed_out: 0,
            cancel_after: self.cancel_after.clone(),
            drops: Arc::clone(&self.playback_drops),
        })
    }

    fn frame_at(&self, _source: &StagedSource, timestamp: f64, dims: ResolvedDimensions) -> CoreResult<DecodedFrame> {
        self.frame_at_calls.fetch_add(1, Ordering::SeqCst);
        if self.frame_at_fails {
            return Err(CoreError::MediaDecode(format!("seek to {timestamp} failed")));
        }
        Ok(DecodedFrame::solid(dims.width, dims.height, timestamp, [40, 80, 120]))
    }
}

// ---- Sink ----

/// What a mock sink does for a given preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkBehavior {
    /// Produces an output of this many bytes
    Output(u64),
    /// Fails on open with an Encode error
    EncodeError,
    /// Fails on open with SinkUnavailable
    Unavailable,
    /// Accepts frames, then fails on finish
    FailOnFinish,
}

/// One sink that was opened.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRecord {
    pub settings: SinkSettings,
    pub frames: u64,
    pub finished: bool,
    pub dropped: bool,
}

pub type SinkLog = Arc<Mutex<Vec<SinkRecord>>>;

/// Sink factory keyed by requested bitrate (Standard profile) with a separate
/// behaviour for the Conservative profile.
#[derive(Debug, Clone)]
pub struct MockSinkFactory {
    pub by_bitrate: HashMap<u32, SinkBehavior>,
    pub default: SinkBehavior,
    pub conservative: SinkBehavior,
    log: SinkLog,
}

impl MockSinkFactory {
    pub fn new(default: SinkBehavior) -> Self {
        Self {
            by_bitrate: HashMap::new(),
            default,
            conservative: SinkBehavior::Output(512 * 1024),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Behaviour for the preset with `bitrate_kbps`.
    pub fn on_bitrate(mut self, bitrate_kbps: u32, behavior: SinkBehavior) -> Self {
        self.by_bitrate.insert(bitrate_kbps, behavior);
        self
    }

    pub fn on_conservative(mut self, behavior: SinkBehavior) -> Self {
        self.conservative = behavior;
        self
    }

    pub fn log(&self) -> SinkLog {
        Arc::clone(&self.log)
    }

    fn behavior_for(&self, settings: &SinkSettings) -> SinkBehavior {
        match settings.profile {
            SinkProfile::Conservative => self.conservative,
            SinkProfile::Standard => *self.by_bitrate.get(&settings.bitrate_kbps).unwrap_or(&self.default),
        }
    }
}

impl SinkFactory for MockSinkFactory {
    type Sink = MockSink;

    fn open(&self, settings: &SinkSettings) -> CoreResult<MockSink> {
        let behavior = self.behavior_for(settings);
        let index = {
            let mut log = self.log.lock().unwrap();
            log.push(SinkRecord {
                settings: settings.clone(),
                frames: 0,
                finished: false,
                dropped: false,
            });
            log.len() - 1
        };
        match behavior {
            SinkBehavior::EncodeError => Err(CoreError::Encode(format!(
                "encoder rejected {} kbps",
                settings.bitrate_kbps
            ))),
            SinkBehavior::Unavailable => Err(CoreError::SinkUnavailable("no h264 encoder".to_string())),
            _ => Ok(MockSink {
                behavior,
                dims: settings.dims,
                frames: 0,
                index,
                log: Arc::clone(&self.log),
            }),
        }
    }
}

pub struct MockSink {
    behavior: SinkBehavior,
    dims: ResolvedDimensions,
    frames: u64,
    index: usize,
    log: SinkLog,
}

impl EncodingSink for MockSink {
    fn write_frame(&mut self, surface: &RasterSurface) -> CoreResult<()> {
        assert_eq!(surface.dimensions(), self.dims, "surface does not match sink");
        assert!(surface.has_content(), "blank surface written to sink");
        self.frames += 1;
        self.log.lock().unwrap()[self.index].frames = self.frames;
        Ok(())
    }

    fn finish(self) -> CoreResult<Vec<u8>> {
        self.log.lock().unwrap()[self.index].finished = true;
        match self.behavior {
            SinkBehavior::Output(size) => Ok(vec![0u8; size as usize]),
            _ => Err(CoreError::Encode("muxer failed to finalize".to_string())),
        }
    }
}

impl Drop for MockSink {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log[self.index].dropped = true;
        }
    }
}

// ---- Helpers ----

pub fn video_source(size: u64) -> squish_core::SourceMedia {
    squish_core::SourceMedia::new(vec![0u8; size as usize], "video/mp4")
}

/// Bitrates of the opened sinks, in order.
pub fn opened_bitrates(log: &SinkLog) -> Vec<u32> {
    log.lock().unwrap().iter().map(|r| r.settings.bitrate_kbps).collect()
}
