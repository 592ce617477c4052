// ============================================================================
// squish-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the ffmpeg / ffprobe Binaries
//
// This module encapsulates the process-level plumbing shared by the media
// backends: dependency checks, spawning ffmpeg through ffmpeg-sidecar with
// consistent logging and error mapping, and draining a child's stderr so a
// chatty encoder never blocks on a full pipe.
//
// KEY COMPONENTS:
// - check_dependency / ffmpeg_available: cached availability checks against
//   the same binary ffmpeg-sidecar spawns
// - encoder_available: cached lookup in ffmpeg's encoder list
// - spawn_ffmpeg: spawn wrapper mapping a missing binary to DependencyNotFound
// - StderrTail: background collector of a child's last stderr lines

use crate::error::{CoreError, CoreResult, command_start_error};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::paths::ffmpeg_path;
use once_cell::sync::OnceCell;

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `<cmd> -version` and only inspects whether the process could be
/// started at all.
pub fn check_dependency(cmd: impl AsRef<OsStr>) -> CoreResult<()> {
    let cmd = cmd.as_ref();
    let cmd_name = cmd.to_string_lossy();
    let result = Command::new(cmd)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.into_owned()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(command_start_error(cmd_name.into_owned(), e))
        }
    }
}

/// The ffmpeg binary every `FfmpegCommand` runs: a copy next to the
/// executable if present, otherwise `ffmpeg` from `PATH`.
pub fn ffmpeg_binary() -> PathBuf {
    ffmpeg_path()
}

static FFMPEG_AVAILABLE: OnceCell<bool> = OnceCell::new();

/// Whether ffmpeg can be started on this host. Checked once per process.
pub fn ffmpeg_available() -> bool {
    *FFMPEG_AVAILABLE.get_or_init(|| check_dependency(ffmpeg_binary()).is_ok())
}

static FFMPEG_ENCODERS: OnceCell<String> = OnceCell::new();

/// Whether the installed ffmpeg was built with the named encoder.
///
/// The encoder list is read once per process; a missing ffmpeg lists nothing.
pub fn encoder_available(codec: &str) -> bool {
    let listing = FFMPEG_ENCODERS.get_or_init(|| {
        Command::new(ffmpeg_binary())
            .args(["-hide_banner", "-encoders"])
            .stderr(Stdio::null())
            .output()
            .map(|out| String::from_utf8_lossy(&out.stdout).into_owned())
            .unwrap_or_default()
    });
    encoder_listed(listing, codec)
}

/// Encoder lines look like ` V....D libx264   libx264 H.264 ...`.
fn encoder_listed(listing: &str, codec: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|name| name == codec)
}

// ============================================================================
// PROCESS SPAWNING
// ============================================================================

/// Spawns an ffmpeg command, logging its arguments under `label`.
pub fn spawn_ffmpeg(mut cmd: FfmpegCommand, label: &str) -> CoreResult<FfmpegChild> {
    let args: Vec<String> = cmd
        .as_inner()
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    log::debug!("Spawning ffmpeg ({}): {}", label, args.join(" "));

    cmd.spawn().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CoreError::DependencyNotFound("ffmpeg".to_string())
        } else {
            command_start_error(format!("ffmpeg ({label})"), e)
        }
    })
}

// ============================================================================
// STDERR COLLECTION
// ============================================================================

/// Lines of stderr kept for error messages.
const STDERR_TAIL_LINES: usize = 12;

/// Drains a reader on a background thread, keeping its last few lines.
pub struct StderrTail {
    handle: Option<JoinHandle<VecDeque<String>>>,
}

impl StderrTail {
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> Self {
        let handle = std::thread::spawn(move || {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            for line in BufReader::new(reader).lines() {
                let Ok(line) = line else { break };
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail
        });
        Self { handle: Some(handle) }
    }

    /// Waits for the stream to close and returns the collected tail.
    pub fn finish(mut self) -> String {
        self.join()
    }

    fn join(&mut self) -> String {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(lines)) => Vec::from(lines).join("\n"),
            _ => String::new(),
        }
    }
}

impl Drop for StderrTail {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_is_reported() {
        let result = check_dependency("squish-definitely-not-installed");
        assert!(matches!(result, Err(CoreError::DependencyNotFound(_))));
    }

    #[test]
    fn test_checks_resolve_ffmpeg_like_the_command_builder() {
        assert_eq!(ffmpeg_binary(), ffmpeg_path());
        assert_eq!(
            ffmpeg_binary().file_stem().and_then(|s| s.to_str()),
            Some("ffmpeg")
        );

        let missing = std::env::temp_dir().join("squish-no-such-dir").join("ffmpeg");
        match check_dependency(&missing) {
            Err(CoreError::DependencyNotFound(name)) => {
                assert_eq!(name, missing.to_string_lossy())
            }
            other => panic!("expected DependencyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_encoder_listing_is_matched_by_name() {
        let listing = "Encoders:\n V..... = Video\n ------\n V....D libx264              libx264 H.264\n V....D mpeg4                MPEG-4 part 2\n A....D aac                  AAC\n";
        assert!(encoder_listed(listing, "libx264"));
        assert!(encoder_listed(listing, "mpeg4"));
        assert!(!encoder_listed(listing, "libx265"));
        assert!(!encoder_listed(listing, "H.264"));
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let text: String = (0..20).map(|i| format!("line {i}\n")).collect();
        let tail = StderrTail::spawn(io::Cursor::new(text.into_bytes())).finish();
        let lines: Vec<&str> = tail.lines().collect();
        assert_eq!(lines.len(), STDERR_TAIL_LINES);
        assert_eq!(lines.first(), Some(&"line 8"));
        assert_eq!(lines.last(), Some(&"line 19"));
    }
}
