/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use voxline::app_config::{Config, LogLevel, SynthesisProvider};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.chunking.max_chars, 45);
    assert_eq!(config.chunking.min_merge_chars, 15);
    assert_eq!(config.synthesis.provider, SynthesisProvider::Voicevox);
    assert_eq!(config.synthesis.endpoint, "http://localhost:50021");
    assert_eq!(config.synthesis.default_speaker, 3);
    assert_eq!(config.synthesis.concurrent_requests, 4);
    assert_eq!(config.synthesis.timeout_secs, 60);
    assert!(config.script.narrate_title);
    assert!(config.script.skip_empty_parts);
    assert_eq!(config.script.max_parts, None);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.chunking.max_chars = 0;
    assert!(config.validate().is_err());
    config.chunking.max_chars = 45;

    config.synthesis.concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.synthesis.concurrent_requests = 2;

    config.estimator.min_seconds = -1.0;
    assert!(config.validate().is_err());
    config.estimator.min_seconds = 0.3;

    config.estimator.sentence_pause_secs = f64::NAN;
    assert!(config.validate().is_err());
    config.estimator.sentence_pause_secs = 0.35;

    config.script.max_parts = Some(0);
    assert!(config.validate().is_err());
    config.script.max_parts = Some(3);

    assert!(config.validate().is_ok());
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&config_path)?;
    assert!(config_path.exists());

    let reloaded = Config::load_or_create(&config_path)?;
    assert_eq!(reloaded.chunking, created.chunking);
    assert_eq!(reloaded.synthesis, created.synthesis);
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldKeepOverrides() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
  "synthesis": { "provider": "dryrun", "concurrent_requests": 8 },
  "script": { "narrate_title": false },
  "log_level": "debug"
}"#,
    )?;

    let config = Config::load_or_create(&config_path)?;

    assert_eq!(config.synthesis.provider, SynthesisProvider::DryRun);
    assert_eq!(config.synthesis.concurrent_requests, 8);
    assert_eq!(config.synthesis.default_speaker, 3);
    assert!(!config.script.narrate_title);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    Ok(())
}

#[test]
fn test_load_or_create_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&config_path).is_err());
    Ok(())
}
