//! `probe`: duration and dimensions of a video, as the engine sees them.

use crate::cli::ProbeArgs;
use crate::output::{print_heading, print_info, print_json};

use anyhow::{Context, Result};
use serde::Serialize;
use squish_core::{Compressor, CoreConfig, SourceMedia, format_bytes, format_duration};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ProbeReport<'a> {
    pub input: &'a Path,
    pub mime_type: &'a str,
    pub size_bytes: u64,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

pub fn run_probe(args: ProbeArgs, json: bool) -> Result<()> {
    let compressor =
        Compressor::with_ffmpeg(CoreConfig::from_env()).context("Failed to set up the compression engine")?;
    let source = SourceMedia::from_path(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let metadata = compressor
        .probe(&source)
        .with_context(|| format!("Failed to probe {}", args.input.display()))?;

    if json {
        return print_json(&ProbeReport {
            input: &args.input,
            mime_type: source.mime_type(),
            size_bytes: source.size(),
            duration_secs: metadata.duration_secs,
            width: metadata.native_width,
            height: metadata.native_height,
        });
    }

    print_heading(&args.input.display().to_string());
    print_info("Type", source.mime_type());
    print_info("Size", format_bytes(source.size()));
    print_info("Duration", format_duration(metadata.duration_secs));
    print_info(
        "Dimensions",
        format!("{}x{}", metadata.native_width, metadata.native_height),
    );
    Ok(())
}
