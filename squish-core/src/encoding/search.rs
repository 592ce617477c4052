// ============================================================================
// squish-core/src/encoding/search.rs
// ============================================================================
//
// PROGRESSIVE SEARCH: Walk the Ladder Until the Output Fits
//
// ALGORITHM:
// 1. A source already within the budget is returned unchanged
// 2. Otherwise presets are tried highest quality first; the first attempt
//    whose output fits the budget wins and the search stops
// 3. If nothing fits, the lowest preset's output is returned anyway (forced
//    fallback) so a search over a non-empty ladder always terminates with a
//    result
//
// Preset order is the only ranking. An attempt failing with Encode or
// PlaybackBlocked moves on to the next preset; any other error ends the
// search and is returned to the caller, which decides whether the Fallback
// Compressor can still help.
//
// Every attempt is recorded in a SearchReport owned by the caller, so the
// record survives a search that ends in an error.

use crate::cancel::CancelToken;
use crate::encoding::dimensions::{self, ResolvedDimensions};
use crate::encoding::ladder::{self, QualityPreset, QualityTier};
use crate::encoding::reencoder::{CompressionAttemptResult, FrameReencoder};
use crate::encoding::sink::SinkFactory;
use crate::error::{CoreError, CoreResult};
use crate::media::decode::MediaDecoder;
use crate::media::probe::MediaMetadata;
use crate::media::source::{SourceMedia, StagedSource};
use crate::utils::format_bytes;

use serde::Serialize;

/// How a result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionStrategy {
    /// The source already fit the budget and was returned unchanged.
    Passthrough,
    /// A ladder preset produced output within the budget.
    Ladder,
    /// No preset fit; the lowest preset's output was returned regardless.
    ForcedFallback,
    /// The progressive search failed and the fixed-settings compressor ran.
    SimpleFallback,
}

/// Result of one preset attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    UnderBudget { size_bytes: u64 },
    OverBudget { size_bytes: u64 },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub tier: QualityTier,
    pub dims: ResolvedDimensions,
    /// True for the forced re-attempt with the lowest preset
    pub forced: bool,
    /// True when only a still frame could be encoded
    pub degraded: bool,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Per-call log of every attempt, in the order made.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchReport {
    pub attempts: Vec<AttemptRecord>,
}

impl SearchReport {
    /// Number of encode attempts made, forced re-attempts included.
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Tiers in the order they were attempted.
    pub fn tiers_tried(&self) -> Vec<QualityTier> {
        self.attempts.iter().map(|a| a.tier).collect()
    }
}

/// The chosen attempt and how it was chosen.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub attempt: CompressionAttemptResult,
    pub strategy: CompressionStrategy,
}

impl SearchOutcome {
    pub fn within_budget(&self, target_size_bytes: u64) -> bool {
        self.attempt.size_bytes <= target_size_bytes
    }
}

/// Compresses `original` to fit `target_size_bytes`, starting at `max_quality`.
#[allow(clippy::too_many_arguments)]
pub fn compress_to_target<D: MediaDecoder, F: SinkFactory>(
    reencoder: &FrameReencoder<'_, D, F>,
    original: &SourceMedia,
    staged: &StagedSource,
    metadata: &MediaMetadata,
    target_size_bytes: u64,
    max_quality: QualityTier,
    cancel: &CancelToken,
    report: &mut SearchReport,
) -> CoreResult<SearchOutcome> {
    search_ladder(
        reencoder,
        original,
        staged,
        metadata,
        target_size_bytes,
        ladder::levels_for(max_quality),
        cancel,
        report,
    )
}

/// Like [`compress_to_target`], over an explicit ladder.
#[allow(clippy::too_many_arguments)]
pub fn search_ladder<D: MediaDecoder, F: SinkFactory>(
    reencoder: &FrameReencoder<'_, D, F>,
    original: &SourceMedia,
    staged: &StagedSource,
    metadata: &MediaMetadata,
    target_size_bytes: u64,
    ladder: &[QualityPreset],
    cancel: &CancelToken,
    report: &mut SearchReport,
) -> CoreResult<SearchOutcome> {
    if original.size() <= target_size_bytes {
        log::info!(
            "Source is {} (budget {}); passing through unchanged",
            format_bytes(original.size()),
            format_bytes(target_size_bytes)
        );
        return Ok(SearchOutcome {
            attempt: CompressionAttemptResult::passthrough(original.bytes().to_vec()),
            strategy: CompressionStrategy::Passthrough,
        });
    }

    let Some(lowest) = ladder.last() else {
        return Err(CoreError::EmptyLadder);
    };

    // Output of the lowest preset, kept in case nothing fits.
    let mut lowest_output: Option<CompressionAttemptResult> = None;

    for preset in ladder {
        cancel.check()?;
        let dims = dimensions::resolve(metadata.native_width, metadata.native_height, preset.scale);
        log::info!(
            "Trying {} preset: {} @ {} fps, {} kbps",
            preset.name,
            dims,
            preset.frame_rate,
            preset.bitrate_kbps
        );

        match reencoder.encode(staged, metadata, dims, preset, cancel) {
            Ok(attempt) if attempt.size_bytes <= target_size_bytes => {
                log::info!(
                    "{} preset fits: {} <= {}",
                    preset.name,
                    format_bytes(attempt.size_bytes),
                    format_bytes(target_size_bytes)
                );
                report.attempts.push(AttemptRecord {
                    tier: preset.name,
                    dims,
                    forced: false,
                    degraded: attempt.degraded,
                    outcome: AttemptOutcome::UnderBudget { size_bytes: attempt.size_bytes },
                });
                return Ok(SearchOutcome {
                    attempt,
                    strategy: CompressionStrategy::Ladder,
                });
            }
            Ok(attempt) => {
                log::info!(
                    "{} preset too large: {} > {}",
                    preset.name,
                    format_bytes(attempt.size_bytes),
                    format_bytes(target_size_bytes)
                );
                report.attempts.push(AttemptRecord {
                    tier: preset.name,
                    dims,
                    forced: false,
                    degraded: attempt.degraded,
                    outcome: AttemptOutcome::OverBudget { size_bytes: attempt.size_bytes },
                });
                if preset.name == lowest.name {
                    lowest_output = Some(attempt);
                }
            }
            Err(e) if e.is_preset_recoverable() => {
                log::warn!("{} preset failed, trying the next one: {}", preset.name, e);
                report.attempts.push(AttemptRecord {
                    tier: preset.name,
                    dims,
                    forced: false,
                    degraded: false,
                    outcome: AttemptOutcome::Failed { error: e.to_string() },
                });
            }
            Err(e) => {
                log::warn!("Search stopped at the {} preset: {}", preset.name, e);
                report.attempts.push(AttemptRecord {
                    tier: preset.name,
                    dims,
                    forced: false,
                    degraded: false,
                    outcome: AttemptOutcome::Failed { error: e.to_string() },
                });
                return Err(e);
            }
        }
    }

    // Nothing fit. The lowest preset's output is returned even over budget.
    let attempt = match lowest_output {
        Some(attempt) => attempt,
        None => {
            cancel.check()?;
            let dims = dimensions::resolve(metadata.native_width, metadata.native_height, lowest.scale);
            log::warn!("No preset fit the budget; re-attempting {} as a forced fallback", lowest.name);
            let result = reencoder.encode(staged, metadata, dims, lowest, cancel);
            report.attempts.push(AttemptRecord {
                tier: lowest.name,
                dims,
                forced: true,
                degraded: result.as_ref().is_ok_and(|a| a.degraded),
                outcome: match &result {
                    Ok(a) if a.size_bytes <= target_size_bytes => {
                        AttemptOutcome::UnderBudget { size_bytes: a.size_bytes }
                    }
                    Ok(a) => AttemptOutcome::OverBudget { size_bytes: a.size_bytes },
                    Err(e) => AttemptOutcome::Failed { error: e.to_string() },
                },
            });
            result?
        }
    };

    if attempt.size_bytes > target_size_bytes {
        log::warn!(
            "Returning {} output of {} over the {} budget",
            lowest.name,
            format_bytes(attempt.size_bytes),
            format_bytes(target_size_bytes)
        );
    }
    Ok(SearchOutcome {
        attempt,
        strategy: CompressionStrategy::ForcedFallback,
    })
}
