//! Source media buffers and their on-disk staging.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::temp_files;

/// A raw source buffer and its declared MIME type.
///
/// Owned by the caller; the engine only borrows it for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMedia {
    bytes: Vec<u8>,
    mime_type: String,
}

impl SourceMedia {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Reads a file and infers its MIME type from the extension.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(bytes, mime_from_path(path)))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File extension matching the MIME type, used for staged copies so the
    /// demuxer can sniff the container.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            "video/x-matroska" => "mkv",
            "video/x-msvideo" => "avi",
            "video/mpeg" => "mpg",
            "video/ogg" => "ogv",
            "video/3gpp" => "3gp",
            _ => "mp4",
        }
    }
}

/// Infers a MIME type from a path's extension.
pub fn mime_from_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpg" | "mpeg" => "video/mpeg",
        "ogv" => "video/ogg",
        "3gp" => "video/3gpp",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// A source written to a per-call scratch directory.
///
/// The directory doubles as the scratch space for everything else the call
/// writes (thumbnails), and is removed when this value is dropped.
#[derive(Debug)]
pub struct StagedSource {
    dir: TempDir,
    path: PathBuf,
    size: u64,
}

impl StagedSource {
    /// Writes `source` into a fresh scratch directory.
    pub fn stage(source: &SourceMedia, config: &CoreConfig) -> CoreResult<Self> {
        let dir = temp_files::create_temp_dir(config, "squish_")?;
        let path = dir.path().join(format!("source.{}", source.extension()));
        let mut file = std::fs::File::create(&path)?;
        file.write_all(source.bytes())?;
        file.flush()?;
        log::debug!("Staged {} byte source at {}", source.size(), path.display());
        Ok(Self {
            dir,
            path,
            size: source.size(),
        })
    }

    /// Path of the staged source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scratch directory of this call.
    pub fn scratch_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(Path::new("clip.MP4")), "video/mp4");
        assert_eq!(mime_from_path(Path::new("clip.webm")), "video/webm");
        assert_eq!(mime_from_path(Path::new("notes.txt")), "text/plain");
        assert_eq!(mime_from_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_stage_writes_bytes_and_cleans_up() {
        let base = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            temp_dir: Some(base.path().to_path_buf()),
            ..CoreConfig::default()
        };
        let source = SourceMedia::new(b"not really a video".to_vec(), "video/webm");

        let staged = StagedSource::stage(&source, &config).unwrap();
        assert_eq!(staged.size(), 18);
        assert_eq!(staged.path().extension().unwrap(), "webm");
        assert_eq!(std::fs::read(staged.path()).unwrap(), source.bytes());

        let dir = staged.scratch_dir().to_path_buf();
        drop(staged);
        assert!(!dir.exists());
    }
}
