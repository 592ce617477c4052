// ============================================================================
// squish-core/src/encoding/sink.rs
// ============================================================================
//
// ENCODING SINK: Raw Frames In, Container Chunks Out
//
// A sink consumes constant-rate raw frames and produces a compressed MP4. The
// production sink is an ffmpeg process fed rgb24 frames on stdin that writes
// fragmented MP4 to stdout. A reader thread forwards stdout chunks through an
// mpsc channel as they become available; chunks are appended in delivery
// order, which reconstructs the container byte stream.
//
// ERROR MAPPING:
// - ffmpeg missing or the codec not compiled in -> SinkUnavailable
// - a rejected write, a failed exit or empty output -> Encode
//
// The ffmpeg process is killed and reaped if the sink is dropped before
// `finish`, so an abandoned attempt never leaves an encoder running.

use crate::encoding::dimensions::ResolvedDimensions;
use crate::encoding::raster::RasterSurface;
use crate::error::{CoreError, CoreResult};
use crate::external::{StderrTail, encoder_available, ffmpeg_available, spawn_ffmpeg};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ChildStdin;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

/// Size of one stdout read forwarded to the sink's channel.
const CHUNK_SIZE: usize = 64 * 1024;

/// Encoder family used by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkProfile {
    /// H.264 through libx264. Best size/quality, needs a full ffmpeg build.
    Standard,
    /// MPEG-4 part 2, built into every ffmpeg.
    Conservative,
}

impl SinkProfile {
    pub fn codec(self) -> &'static str {
        match self {
            SinkProfile::Standard => "libx264",
            SinkProfile::Conservative => "mpeg4",
        }
    }
}

/// Everything a sink needs to know before the first frame arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkSettings {
    pub dims: ResolvedDimensions,
    pub frame_rate: u32,
    pub bitrate_kbps: u32,
    pub profile: SinkProfile,
    /// File whose first audio stream is muxed into the output, if any
    pub audio_source: Option<PathBuf>,
    pub audio_bitrate_kbps: u32,
}

/// A streaming motion encoder.
pub trait EncodingSink {
    /// Appends one frame. The surface must match the sink's dimensions.
    fn write_frame(&mut self, surface: &RasterSurface) -> CoreResult<()>;

    /// Flushes the encoder and returns the complete output.
    fn finish(self) -> CoreResult<Vec<u8>>;
}

/// Creates sinks. One sink is opened per encode attempt.
pub trait SinkFactory: Send + Sync {
    type Sink: EncodingSink;

    fn open(&self, settings: &SinkSettings) -> CoreResult<Self::Sink>;
}

// ============================================================================
// FFMPEG SINK
// ============================================================================

/// Opens ffmpeg sinks.
#[derive(Debug, Clone, Default)]
pub struct SidecarSinkFactory;

impl SidecarSinkFactory {
    pub fn new() -> Self {
        Self
    }
}

/// Builds the ffmpeg command line for `settings`.
fn sink_command(settings: &SinkSettings) -> FfmpegCommand {
    let bitrate = format!("{}k", settings.bitrate_kbps);
    let bufsize = format!("{}k", settings.bitrate_kbps.saturating_mul(2));

    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner();
    cmd.args(["-loglevel", "error"]);
    cmd.args(["-f", "rawvideo", "-pix_fmt", "rgb24"]);
    cmd.args(["-s", &settings.dims.to_string()]);
    cmd.args(["-r", &settings.frame_rate.to_string()]);
    cmd.input("pipe:0");

    if let Some(audio) = &settings.audio_source {
        cmd.input(audio.to_string_lossy().as_ref());
        cmd.args(["-map", "0:v:0", "-map", "1:a:0?"]);
        cmd.args(["-c:a", "aac", "-b:a", &format!("{}k", settings.audio_bitrate_kbps)]);
        cmd.arg("-shortest");
    } else {
        cmd.arg("-an");
    }

    cmd.args(["-c:v", settings.profile.codec()]);
    if settings.profile == SinkProfile::Standard {
        cmd.args(["-preset", "veryfast"]);
    }
    cmd.args(["-b:v", &bitrate, "-maxrate", &bitrate, "-bufsize", &bufsize]);
    cmd.args(["-pix_fmt", "yuv420p"]);
    cmd.args(["-movflags", "frag_keyframe+empty_moov+default_base_moof"]);
    cmd.args(["-f", "mp4"]);
    cmd.output("pipe:1");
    cmd
}

impl SinkFactory for SidecarSinkFactory {
    type Sink = SidecarSink;

    fn open(&self, settings: &SinkSettings) -> CoreResult<SidecarSink> {
        if !ffmpeg_available() {
            return Err(CoreError::SinkUnavailable("ffmpeg is not installed".to_string()));
        }
        let codec = settings.profile.codec();
        if !encoder_available(codec) {
            return Err(CoreError::SinkUnavailable(format!(
                "ffmpeg was built without the {codec} encoder"
            )));
        }

        let mut child = match spawn_ffmpeg(sink_command(settings), "sink") {
            Ok(child) => child,
            Err(CoreError::DependencyNotFound(tool)) => {
                return Err(CoreError::SinkUnavailable(format!("{tool} is not installed")));
            }
            Err(e) => return Err(e),
        };

        let pipes = (child.take_stdin(), child.take_stdout(), child.take_stderr());
        let (Some(stdin), Some(stdout), Some(stderr)) = pipes else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CoreError::Encode("encoder pipes were not available".to_string()));
        };

        let (tx, chunks) = mpsc::channel();
        let reader = std::thread::spawn(move || -> io::Result<()> {
            let mut stdout = stdout;
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                if tx.send(buf[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });

        log::debug!(
            "Opened {} sink at {} {} fps {} kbps",
            codec,
            settings.dims,
            settings.frame_rate,
            settings.bitrate_kbps
        );

        Ok(SidecarSink {
            child,
            stdin: Some(stdin),
            chunks,
            reader: Some(reader),
            stderr: Some(StderrTail::spawn(stderr)),
            output: Vec::new(),
            frame_len: settings.dims.rgb24_frame_len(),
            finished: false,
        })
    }
}

/// A running ffmpeg encoder.
pub struct SidecarSink {
    child: FfmpegChild,
    stdin: Option<ChildStdin>,
    chunks: Receiver<Vec<u8>>,
    reader: Option<JoinHandle<io::Result<()>>>,
    stderr: Option<StderrTail>,
    output: Vec<u8>,
    frame_len: usize,
    finished: bool,
}

impl SidecarSink {
    /// Moves every chunk delivered so far into the output buffer.
    fn drain_ready(&mut self) {
        loop {
            match self.chunks.try_recv() {
                Ok(chunk) => self.output.extend_from_slice(&chunk),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Kills the encoder and returns whatever it printed to stderr.
    fn abort(&mut self) -> String {
        self.finished = true;
        self.stdin = None;
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        self.stderr.take().map(StderrTail::finish).unwrap_or_default()
    }
}

impl EncodingSink for SidecarSink {
    fn write_frame(&mut self, surface: &RasterSurface) -> CoreResult<()> {
        let bytes = surface.as_bytes();
        if bytes.len() != self.frame_len {
            return Err(CoreError::Encode(format!(
                "frame of {} bytes does not match the sink's {} byte frames",
                bytes.len(),
                self.frame_len
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CoreError::Encode("sink is already closed".to_string()));
        };
        if let Err(e) = stdin.write_all(bytes) {
            let tail = self.abort();
            return Err(CoreError::Encode(format!("encoder rejected frame: {e}: {tail}")));
        }

        self.drain_ready();
        Ok(())
    }

    fn finish(mut self) -> CoreResult<Vec<u8>> {
        // Closing stdin signals end of stream.
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush() {
                let tail = self.abort();
                return Err(CoreError::Encode(format!("could not flush encoder input: {e}: {tail}")));
            }
        }

        // The reader thread exits once ffmpeg closes stdout.
        let read_result = match self.reader.take().map(JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(io::Error::other("encoder output reader panicked")),
            None => Ok(()),
        };
        while let Ok(chunk) = self.chunks.recv() {
            self.output.extend_from_slice(&chunk);
        }

        let status = self.child.wait();
        self.finished = true;
        let tail = self.stderr.take().map(StderrTail::finish).unwrap_or_default();

        let status = status.map_err(|e| CoreError::Encode(format!("could not wait for encoder: {e}")))?;
        if !status.success() {
            return Err(CoreError::Encode(format!("encoder exited with {status}: {tail}")));
        }
        read_result.map_err(|e| CoreError::Encode(format!("could not read encoder output: {e}")))?;
        if self.output.is_empty() {
            return Err(CoreError::Encode("encoder produced no output".to_string()));
        }

        log::debug!("Sink finished with {} bytes", self.output.len());
        Ok(std::mem::take(&mut self.output))
    }
}

impl Drop for SidecarSink {
    fn drop(&mut self) {
        if !self.finished {
            self.abort();
        }
    }
}
