// ============================================================================
// squish-cli/src/commands/compress.rs
// ============================================================================
//
// COMPRESS COMMAND: Read, Compress, Write
//
// 1. Build the engine configuration (defaults, SQUISH_* env, then flags)
// 2. Read the input file and infer its MIME type from the extension
// 3. Run one compression call with a spinner on stderr
// 4. Write the output container and, if asked, the thumbnail
// 5. Print a summary (or a JSON report with --json)

use crate::cli::CompressArgs;
use crate::output::{print_heading, print_info, print_json, print_success, print_warning, spinner};

use anyhow::{Context, Result};
use serde::Serialize;
use squish_core::{
    CancelToken, CompressOptions, CompressedVideo, CompressionResult, CompressionStrategy,
    Compressor, CoreConfig, CoreConfigBuilder, JsonLinesObserver, QualityTier, SearchReport,
    SourceMedia, format_bytes, format_duration,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Machine-readable summary printed with `--json`.
#[derive(Debug, Serialize)]
pub struct CompressReport<'a> {
    pub video_id: &'a str,
    pub input: &'a Path,
    pub output: &'a Path,
    pub target_size_mb: f64,
    pub strategy: CompressionStrategy,
    pub preset: Option<QualityTier>,
    pub degraded: bool,
    pub within_budget: bool,
    pub result: &'a CompressionResult,
    pub search: &'a SearchReport,
}

/// Engine configuration for this invocation.
pub fn build_config(args: &CompressArgs) -> CoreConfig {
    let base = CoreConfig::from_env();
    let include_audio = base.include_audio && !args.no_audio;
    let mut builder = CoreConfigBuilder::from_config(base).include_audio(include_audio);
    if let Some(dir) = &args.temp_dir {
        builder = builder.temp_dir(dir.clone());
    }
    builder.build()
}

/// Per-call options for this invocation.
pub fn build_options(args: &CompressArgs) -> CompressOptions {
    let mut options = CompressOptions::new(args.target_mb)
        .max_quality(args.max_quality)
        .generate_thumbnail(args.thumbnail.is_some());
    if let Some(id) = &args.video_id {
        options = options.video_id(id.clone());
    }
    options
}

pub fn run_compress(args: CompressArgs, json: bool) -> Result<()> {
    let output_path: PathBuf = args.output_path();
    let config = build_config(&args);
    let options = build_options(&args);

    let mut compressor =
        Compressor::with_ffmpeg(config).context("Failed to set up the compression engine")?;
    if args.events {
        compressor.add_observer(Arc::new(JsonLinesObserver::new()));
    }

    let source = SourceMedia::from_path(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    log::info!(
        "Input: {} ({}, {})",
        args.input.display(),
        source.mime_type(),
        format_bytes(source.size())
    );

    let progress = (!json).then(|| {
        spinner(&format!(
            "Compressing {} to {:.2} MB",
            args.input.display(),
            args.target_mb
        ))
    });
    let compressed = compressor.compress(&source, &options, &CancelToken::new());
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    let video = compressed.with_context(|| format!("Failed to compress {}", args.input.display()))?;

    fs::write(&output_path, &video.bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    if let Some(path) = &args.thumbnail {
        write_thumbnail(&video, path)?;
    }

    if json {
        return print_json(&CompressReport {
            video_id: &video.video_id,
            input: &args.input,
            output: &output_path,
            target_size_mb: args.target_mb,
            strategy: video.strategy,
            preset: video.preset_used.map(|p| p.name),
            degraded: video.degraded,
            within_budget: video.within_budget,
            result: &video.result,
            search: &video.report,
        });
    }

    print_summary(&video, &output_path, args.target_mb);
    Ok(())
}

fn write_thumbnail(video: &CompressedVideo, path: &Path) -> Result<()> {
    match &video.result.thumbnail {
        Some(jpeg) => {
            fs::write(path, jpeg).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Thumbnail written to {}", path.display());
        }
        None => log::warn!("No thumbnail could be captured"),
    }
    Ok(())
}

fn print_summary(video: &CompressedVideo, output: &Path, target_mb: f64) {
    let result = &video.result;
    print_heading("Compression Summary");
    print_info("Output", output.display());
    print_info("Original", format!("{:.2} MB", result.original_size_mb));
    print_info("Compressed", format!("{:.2} MB", result.compressed_size_mb));
    print_info("Reduced by", format!("{:.1}%", result.compression_ratio * 100.0));
    print_info("Tier", result.quality_tier);
    print_info("Strategy", format!("{:?}", video.strategy));
    if let Some(preset) = &video.preset_used {
        print_info(
            "Preset",
            format!("{} ({} fps, {} kbps)", preset.name, preset.frame_rate, preset.bitrate_kbps),
        );
    }
    print_info("Attempts", video.report.attempt_count());
    print_info("Time", format_duration(result.processing_time_sec()));

    if video.degraded {
        print_warning("Only a single still frame could be encoded");
    }
    if video.within_budget {
        print_success(&format!("Output fits the {target_mb:.2} MB budget"));
    } else {
        print_warning(&format!(
            "Output is over the {target_mb:.2} MB budget; this is the smallest preset's result"
        ));
    }
}
