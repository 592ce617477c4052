// ============================================================================
// squish-core/src/compressor.rs
// ============================================================================
//
// ENGINE ENTRY: One Compression Call, End to End
//
// WORKFLOW:
// 1. Pre-checks (video MIME type, hard size ceiling), then a Started event
// 2. Stage the source and probe it; an unreadable source ends the call
// 3. Capture a thumbnail if asked (failure only loses the thumbnail)
// 4. Progressive search over the ladder
// 5. If the search fails for any reason other than a fatal input error or
//    cancellation, run the Fallback Compressor; if that fails too, the call
//    fails with CompressionFailed carrying the search error as its source
// 6. Summarise into a CompressionResult and emit Completed or Failed
//
// Each call owns its staged file, decoder process, raster surface and sink.
// A Compressor holds only read-only state, so one instance serves any number
// of concurrent calls; `compress_batch` runs them on rayon's pool.

use crate::cancel::CancelToken;
use crate::config::{CompressOptions, CoreConfig};
use crate::encoding::fallback::simple_compress;
use crate::encoding::ladder::QualityPreset;
use crate::encoding::reencoder::{AudioPolicy, CompressionAttemptResult, FrameReencoder};
use crate::encoding::search::{CompressionStrategy, SearchReport, compress_to_target};
use crate::encoding::sink::{SidecarSinkFactory, SinkFactory};
use crate::error::{CoreError, CoreResult};
use crate::events::{CompressionEvent, CompressionObserver, CompressionStatus, EventDispatcher};
use crate::media::decode::{MediaDecoder, SidecarDecoder};
use crate::media::probe::{FfprobeProber, MediaMetadata, MediaProber, thumbnail_offset};
use crate::media::source::{SourceMedia, StagedSource};
use crate::metrics::{CompressionResult, summarize};
use crate::temp_files::random_suffix;
use crate::utils::{bytes_to_mb, format_bytes, format_duration};
use crate::validation::{check_media_type, check_size_ceiling};

use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Everything a successful call returns.
#[derive(Debug, Clone)]
pub struct CompressedVideo {
    /// Identifier used in the call's lifecycle events
    pub video_id: String,
    /// The output container (the source itself on passthrough)
    pub bytes: Vec<u8>,
    pub result: CompressionResult,
    pub strategy: CompressionStrategy,
    pub preset_used: Option<QualityPreset>,
    /// Only a still frame could be encoded
    pub degraded: bool,
    pub within_budget: bool,
    pub report: SearchReport,
}

/// The compression engine.
pub struct Compressor<P, D, F> {
    prober: P,
    decoder: D,
    sinks: F,
    config: CoreConfig,
    events: EventDispatcher,
}

impl Compressor<FfprobeProber, SidecarDecoder, SidecarSinkFactory> {
    /// Engine backed by the installed ffprobe / ffmpeg binaries.
    pub fn with_ffmpeg(config: CoreConfig) -> CoreResult<Self> {
        Self::new(
            FfprobeProber::new(),
            SidecarDecoder::new(),
            SidecarSinkFactory::new(),
            config,
        )
    }
}

impl<P: MediaProber, D: MediaDecoder, F: SinkFactory> Compressor<P, D, F> {
    pub fn new(prober: P, decoder: D, sinks: F, config: CoreConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            prober,
            decoder,
            sinks,
            config,
            events: EventDispatcher::new(),
        })
    }

    /// Registers an observer of lifecycle events.
    pub fn add_observer(&mut self, observer: Arc<dyn CompressionObserver>) {
        self.events.add_observer(observer);
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CompressionObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Stages and probes a source without compressing it.
    pub fn probe(&self, source: &SourceMedia) -> CoreResult<MediaMetadata> {
        let staged = StagedSource::stage(source, &self.config)?;
        self.prober.probe(&staged)
    }

    /// Compresses one source.
    pub fn compress(
        &self,
        source: &SourceMedia,
        options: &CompressOptions,
        cancel: &CancelToken,
    ) -> CoreResult<CompressedVideo> {
        let start = Instant::now();
        options.validate()?;
        check_media_type(source.mime_type())?;
        check_size_ceiling(source.size(), self.config.max_source_bytes)?;

        let video_id = options.video_id.clone().unwrap_or_else(generate_video_id);
        log::info!(
            "Compressing {} ({}, {}) to {:.2} MB",
            video_id,
            source.mime_type(),
            format_bytes(source.size()),
            options.target_size_mb
        );
        self.events.emit(CompressionEvent::Started {
            video_id: video_id.clone(),
            original_size_mb: bytes_to_mb(source.size()),
            target_size_mb: options.target_size_mb,
            status: CompressionStatus::Processing,
        });

        match self.run(source, options, cancel, &video_id, start) {
            Ok(video) => {
                log::info!(
                    "Compressed {}: {:.2} MB -> {:.2} MB ({:.1}% reduction, {:?}) in {}",
                    video_id,
                    video.result.original_size_mb,
                    video.result.compressed_size_mb,
                    video.result.compression_ratio * 100.0,
                    video.strategy,
                    format_duration(video.result.processing_time_sec())
                );
                self.events.emit(CompressionEvent::Completed {
                    video_id,
                    compressed_size_mb: video.result.compressed_size_mb,
                    compression_ratio: video.result.compression_ratio,
                    status: CompressionStatus::Completed,
                    processing_time_sec: video.result.processing_time_sec(),
                    degraded: video.degraded,
                });
                Ok(video)
            }
            Err(e) => {
                log::error!("Compression of {} failed: {}", video_id, e);
                self.events.emit(CompressionEvent::Failed {
                    video_id,
                    compressed_size_mb: 0.0,
                    compression_ratio: 0.0,
                    status: CompressionStatus::Failed,
                    processing_time_sec: start.elapsed().as_secs_f64(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Compresses several sources concurrently. Results keep the input order.
    pub fn compress_batch(
        &self,
        jobs: &[(SourceMedia, CompressOptions)],
        cancel: &CancelToken,
    ) -> Vec<CoreResult<CompressedVideo>> {
        log::info!("Compressing a batch of {} sources", jobs.len());
        jobs.par_iter()
            .map(|(source, options)| self.compress(source, options, cancel))
            .collect()
    }

    fn run(
        &self,
        source: &SourceMedia,
        options: &CompressOptions,
        cancel: &CancelToken,
        video_id: &str,
        start: Instant,
    ) -> CoreResult<CompressedVideo> {
        let staged = StagedSource::stage(source, &self.config)?;
        let metadata = self.prober.probe(&staged)?;
        log::debug!(
            "{}: {}x{}, {}",
            video_id,
            metadata.native_width,
            metadata.native_height,
            format_duration(metadata.duration_secs)
        );

        let thumbnail = if options.generate_thumbnail {
            self.capture_thumbnail(&staged, &metadata)
        } else {
            None
        };

        let audio = AudioPolicy {
            include: self.config.include_audio,
            bitrate_kbps: self.config.audio_bitrate_kbps,
        };
        let target = options.target_size_bytes();
        let reencoder = FrameReencoder::new(&self.decoder, &self.sinks, audio);
        let mut report = SearchReport::default();

        let searched = compress_to_target(
            &reencoder,
            source,
            &staged,
            &metadata,
            target,
            options.max_quality,
            cancel,
            &mut report,
        );
        let (attempt, strategy): (CompressionAttemptResult, CompressionStrategy) = match searched {
            Ok(outcome) => (outcome.attempt, outcome.strategy),
            Err(e) if e.is_fatal() => return Err(e),
            Err(search_error) => {
                log::warn!(
                    "Progressive search failed for {} ({}); falling back to fixed settings",
                    video_id,
                    search_error
                );
                match simple_compress(
                    &self.decoder,
                    &self.sinks,
                    &staged,
                    &metadata,
                    target,
                    &self.config.fallback,
                    audio,
                    cancel,
                ) {
                    Ok(attempt) => (attempt, CompressionStrategy::SimpleFallback),
                    Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
                    Err(fallback_error) => {
                        return Err(CoreError::CompressionFailed {
                            message: format!("no strategy could compress {video_id}"),
                            fallback_error: fallback_error.to_string(),
                            source: Box::new(search_error),
                        });
                    }
                }
            }
        };

        if attempt.degraded {
            log::warn!("{}: output is a degraded still-frame encode", video_id);
        }
        let within_budget = attempt.size_bytes <= target;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = summarize(source.size(), attempt.size_bytes, elapsed_ms, thumbnail);

        Ok(CompressedVideo {
            video_id: video_id.to_string(),
            bytes: attempt.output_bytes,
            result,
            strategy,
            preset_used: attempt.preset_used,
            degraded: attempt.degraded,
            within_budget,
            report,
        })
    }

    fn capture_thumbnail(&self, staged: &StagedSource, metadata: &MediaMetadata) -> Option<Vec<u8>> {
        let offset = thumbnail_offset(self.config.thumbnail_offset_secs, metadata);
        match self.prober.thumbnail(staged, offset, self.config.thumbnail_quality) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Thumbnail capture failed, continuing without one: {}", e);
                None
            }
        }
    }
}

/// Compresses `source` with the ffmpeg backends and the default configuration.
pub fn compress_video(source: &SourceMedia, options: &CompressOptions) -> CoreResult<CompressedVideo> {
    Compressor::with_ffmpeg(CoreConfig::default())?.compress(source, options, &CancelToken::new())
}

/// Timestamp plus random suffix, e.g. `20261018T143012-a8Fq2ZkP`.
fn generate_video_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%S"),
        random_suffix(8)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_shaped() {
        let a = generate_video_id();
        let b = generate_video_id();
        assert_ne!(a, b);
        let (stamp, suffix) = a.split_once('-').unwrap();
        assert_eq!(stamp.len(), "20261018T143012".len());
        assert_eq!(suffix.len(), 8);
    }
}
