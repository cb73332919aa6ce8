/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use voxline::file_utils::FileManager;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "script.json", "{}")?;

    assert!(FileManager::file_exists(&test_file));
    Ok(())
}

#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_script.json"));
}

/// Test that generate_output_path keeps the stem and swaps the suffix
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let input_file = Path::new("/tmp/scripts/news_0412.json");
    let output_dir = Path::new("/tmp/output");

    assert_eq!(
        FileManager::generate_output_path(input_file, output_dir, "timeline.json"),
        Path::new("/tmp/output/news_0412.timeline.json")
    );
    assert_eq!(
        FileManager::generate_output_path(input_file, output_dir, "srt"),
        Path::new("/tmp/output/news_0412.srt")
    );
}

#[test]
fn test_find_files_withNestedDirectories_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("week_2");
    fs::create_dir_all(&nested)?;

    common::create_test_file(temp_dir.path(), "b.json", "{}")?;
    common::create_test_file(temp_dir.path(), "a.json", "{}")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "ignored")?;
    common::create_test_file(&nested, "c.JSON", "{}")?;

    let found = FileManager::find_files(temp_dir.path(), "json")?;
    let names: Vec<String> = found
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();

    assert_eq!(found.len(), 3);
    assert!(names.contains(&"a.json".to_string()));
    assert!(names.contains(&"c.JSON".to_string()));
    assert!(!names.contains(&"notes.txt".to_string()));

    let mut sorted = found.clone();
    sorted.sort();
    assert_eq!(found, sorted);
    Ok(())
}

#[test]
fn test_write_to_file_withMissingParent_shouldCreateDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("out").join("deep").join("news.srt");

    FileManager::write_to_file(&target, "1\n")?;

    assert_eq!(FileManager::read_to_string(&target)?, "1\n");
    Ok(())
}

#[test]
fn test_append_to_log_file_shouldKeepEarlierEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_file = temp_dir.path().join("runs.log");

    FileManager::append_to_log_file(&log_file, "first run")?;
    FileManager::append_to_log_file(&log_file, "second run")?;

    let content = fs::read_to_string(&log_file)?;
    let first = content.find("first run");
    let second = content.find("second run");
    assert!(first.is_some() && second.is_some());
    assert!(first < second);
    Ok(())
}

/// Test that clear_dir removes an earlier run's files, nested ones included
#[test]
fn test_clear_dir_withStaleFiles_shouldRemoveDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let audio_dir = temp_dir.path().join("news_audio");
    fs::create_dir_all(audio_dir.join("nested"))?;
    common::create_test_file(&audio_dir, "part_009_chunk_000.wav", "RIFF")?;
    common::create_test_file(&audio_dir.join("nested"), "left.wav", "RIFF")?;

    FileManager::clear_dir(&audio_dir)?;

    assert!(!audio_dir.exists());
    Ok(())
}

#[test]
fn test_clear_dir_withMissingDirectory_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    FileManager::clear_dir(temp_dir.path().join("never_created"))?;
    Ok(())
}
