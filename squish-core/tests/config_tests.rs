// squish-core/tests/config_tests.rs

use squish_core::config::{
    CompressOptions, CoreConfig, CoreConfigBuilder, DEFAULT_FALLBACK_FRAME_RATE,
    DEFAULT_MAX_SOURCE_BYTES,
};
use squish_core::{CoreError, QualityTier};
use std::env;
use std::path::PathBuf;

#[test]
fn test_default_config() {
    let config = CoreConfig::default();
    assert!(config.include_audio);
    assert_eq!(config.max_source_bytes, DEFAULT_MAX_SOURCE_BYTES);
    assert_eq!(config.fallback.frame_rate, DEFAULT_FALLBACK_FRAME_RATE);
    assert!(config.temp_dir.is_none());
    assert!(config.validate().is_ok());

    let options = CompressOptions::default();
    assert_eq!(options.max_quality, QualityTier::High);
    assert!(options.generate_thumbnail);
    assert_eq!(options.target_size_bytes(), 10 * 1024 * 1024);
}

#[test]
fn test_builder_pattern() {
    let config = CoreConfigBuilder::new()
        .temp_dir(PathBuf::from("/var/tmp/squish"))
        .include_audio(false)
        .max_source_bytes(1024)
        .build();

    assert_eq!(config.temp_dir, Some(PathBuf::from("/var/tmp/squish")));
    assert!(!config.include_audio);
    assert_eq!(config.max_source_bytes, 1024);
}

#[test]
fn test_invalid_values_are_rejected() {
    let config = CoreConfigBuilder::new().thumbnail_quality(1.5).build();
    assert!(matches!(config.validate(), Err(CoreError::Config(_))));

    let config = CoreConfigBuilder::new().fallback_frame_rate(0).build();
    assert!(matches!(config.validate(), Err(CoreError::Config(_))));

    assert!(CompressOptions::new(-1.0).validate().is_err());
    assert!(CompressOptions::new(f64::NAN).validate().is_err());
}

// The only test in this binary that touches the environment.
#[test]
fn test_env_var_overrides() {
    let keys = [
        "SQUISH_TEMP_DIR",
        "SQUISH_INCLUDE_AUDIO",
        "SQUISH_AUDIO_BITRATE",
        "SQUISH_FALLBACK_FPS",
        "SQUISH_THUMBNAIL_OFFSET",
    ];
    // SAFETY: no other test in this binary reads or writes these variables.
    unsafe {
        env::set_var("SQUISH_TEMP_DIR", "/scratch");
        env::set_var("SQUISH_INCLUDE_AUDIO", "false");
        env::set_var("SQUISH_AUDIO_BITRATE", "96");
        env::set_var("SQUISH_FALLBACK_FPS", "not-a-number");
        env::set_var("SQUISH_THUMBNAIL_OFFSET", "2.5");
    }

    let config = CoreConfig::from_env();

    assert_eq!(config.temp_dir, Some(PathBuf::from("/scratch")));
    assert!(!config.include_audio);
    assert_eq!(config.audio_bitrate_kbps, 96);
    // Unparsable values keep the default
    assert_eq!(config.fallback.frame_rate, DEFAULT_FALLBACK_FRAME_RATE);
    assert_eq!(config.thumbnail_offset_secs, 2.5);

    unsafe {
        for key in keys {
            env::remove_var(key);
        }
    }
}
