//! Temporary file management utilities.
//!
//! Every compression call stages its source into its own scratch directory.
//! The tempfile crate removes the directory (and everything the external
//! tools wrote into it) when the handle is dropped, including on error paths.

use crate::config::CoreConfig;
use crate::error::CoreResult;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempDir};

/// Creates a temporary directory with prefix. Auto-cleaned when dropped.
pub fn create_temp_dir(config: &CoreConfig, prefix: &str) -> CoreResult<TempDir> {
    match &config.temp_dir {
        Some(base) => {
            std::fs::create_dir_all(base)?;
            Ok(TempFileBuilder::new().prefix(prefix).tempdir_in(base)?)
        }
        None => Ok(TempFileBuilder::new().prefix(prefix).tempdir()?),
    }
}

/// Returns a temporary file path with random suffix. Does not create the file.
pub fn create_temp_file_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    dir.join(format!("{prefix}_{}.{extension}", random_suffix(6)))
}

/// Random alphanumeric string of `len` characters.
pub(crate) fn random_suffix(len: usize) -> String {
    use rand::distributions::Alphanumeric;
    use rand::{Rng, thread_rng};

    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_is_removed_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            temp_dir: Some(base.path().join("scratch")),
            ..CoreConfig::default()
        };

        let dir = create_temp_dir(&config, "squish_test_").unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.starts_with(base.path().join("scratch")));
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_path_shape() {
        let path = create_temp_file_path(Path::new("/tmp/x"), "thumb", "jpg");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("thumb_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "thumb_".len() + 6 + ".jpg".len());
    }
}
