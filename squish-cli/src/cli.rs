// squish-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use squish_core::QualityTier;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Squish: compress videos to fit a size budget",
    long_about = "Re-encodes a video through a ladder of quality presets until the \
                  output fits the requested size, using ffmpeg via squish-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compresses a video until it fits the target size
    Compress(CompressArgs),
    /// Prints duration and dimensions of a video
    Probe(ProbeArgs),
    /// Runs the upload pre-check without compressing
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct CompressArgs {
    /// Video file to compress
    #[arg(short, long, value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to INPUT_STEM.squished.mp4 next to the input)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output budget in megabytes
    #[arg(short, long, value_name = "MB", env = "SQUISH_TARGET_MB", default_value_t = 10.0)]
    pub target_mb: f64,

    /// Highest preset the search may use (ultra, high, medium, low, minimum)
    #[arg(short = 'q', long, value_name = "TIER", env = "SQUISH_MAX_QUALITY", default_value = "high")]
    pub max_quality: QualityTier,

    /// Write a JPEG thumbnail of the source to this file
    #[arg(long, value_name = "FILE")]
    pub thumbnail: Option<PathBuf>,

    /// Drop the audio track
    #[arg(long)]
    pub no_audio: bool,

    /// Directory for staged sources and scratch files
    #[arg(long, value_name = "DIR", env = "SQUISH_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Identifier reported in lifecycle events
    #[arg(long, value_name = "ID")]
    pub video_id: Option<String>,

    /// Stream lifecycle events to stderr as JSON lines
    #[arg(long)]
    pub events: bool,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Video file to probe
    #[arg(short, long, value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Video file to check
    #[arg(short, long, value_name = "INPUT")]
    pub input: PathBuf,

    /// Output budget in megabytes
    #[arg(short, long, value_name = "MB", env = "SQUISH_TARGET_MB", default_value_t = 10.0)]
    pub target_mb: f64,
}

impl CompressArgs {
    /// Explicit output path, or `<stem>.squished.mp4` beside the input.
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.input.with_file_name(format!("{stem}.squished.mp4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compress_defaults() {
        let cli = Cli::parse_from(["squish", "compress", "-i", "clip.mov"]);
        assert!(!cli.verbose);
        assert!(!cli.json);
        match cli.command {
            Commands::Compress(args) => {
                assert_eq!(args.input, PathBuf::from("clip.mov"));
                assert_eq!(args.target_mb, 10.0);
                assert_eq!(args.max_quality, QualityTier::High);
                assert!(args.thumbnail.is_none());
                assert!(!args.no_audio);
                assert_eq!(args.output_path(), PathBuf::from("clip.squished.mp4"));
            }
            other => panic!("expected compress, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_compress_with_options() {
        let cli = Cli::parse_from([
            "squish",
            "compress",
            "--input",
            "in/clip.mp4",
            "-o",
            "out.mp4",
            "--target-mb",
            "4.5",
            "--max-quality",
            "ultra",
            "--thumbnail",
            "thumb.jpg",
            "--no-audio",
            "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Compress(args) => {
                assert_eq!(args.target_mb, 4.5);
                assert_eq!(args.max_quality, QualityTier::Ultra);
                assert_eq!(args.thumbnail, Some(PathBuf::from("thumb.jpg")));
                assert!(args.no_audio);
                assert_eq!(args.output_path(), PathBuf::from("out.mp4"));
            }
            other => panic!("expected compress, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_tier() {
        let parsed = Cli::try_parse_from(["squish", "compress", "-i", "a.mp4", "--max-quality", "best"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_default_output_keeps_directory() {
        let cli = Cli::parse_from(["squish", "compress", "-i", "videos/holiday.webm"]);
        let Commands::Compress(args) = cli.command else {
            panic!("expected compress");
        };
        assert_eq!(args.output_path(), PathBuf::from("videos/holiday.squished.mp4"));
    }
}
