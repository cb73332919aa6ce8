/*!
 * Tests for narration script loading
 */

use anyhow::Result;
use voxline::app_config::ScriptConfig;
use voxline::script::{ScriptDocument, ScriptPart, TITLE_PART_NAME};

use crate::common;

#[test]
fn test_load_withSampleScript_shouldNarrateTitleFirst() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_script(temp_dir.path(), "news.json")?;

    let script = ScriptDocument::load(&path, &ScriptConfig::default())?;

    assert_eq!(script.title.as_deref(), Some("新モデル発表"));
    assert_eq!(script.parts.len(), 3);
    assert_eq!(script.parts[0].name, TITLE_PART_NAME);
    assert_eq!(script.parts[0].text, "新モデル発表");
    assert_eq!(script.parts[1].name, "article_1");
    assert_eq!(script.parts[2].part_index, 2);
    assert_eq!(script.parts[2].speaker_id, Some(1));
    Ok(())
}

#[test]
fn test_fromJsonStr_withBlankPart_shouldKeepOriginalIndices() -> Result<()> {
    let json = r#"{"content": {"script_parts": [
        {"part": "article_1", "text": "一つ目。"},
        {"part": "article_2", "text": "   "},
        {"part": "reaction", "text": "三つ目。"}
    ]}}"#;

    let script = ScriptDocument::from_json_str(json, &ScriptConfig::default())?;

    let indices: Vec<usize> = script.parts.iter().map(|p| p.part_index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert!(script.part(1).is_none());
    assert_eq!(script.part(2).map(|p| p.name.as_str()), Some("reaction"));
    Ok(())
}

#[test]
fn test_fromJsonStr_withoutSkipping_shouldKeepBlankParts() -> Result<()> {
    let options = ScriptConfig {
        skip_empty_parts: false,
        ..ScriptConfig::default()
    };
    let json = r#"{"content": {"script_parts": [{"part": "a", "text": ""}, {"part": "b", "text": "x"}]}}"#;

    let script = ScriptDocument::from_json_str(json, &options)?;
    assert_eq!(script.parts.len(), 2);
    Ok(())
}

#[test]
fn test_fromJsonStr_withMaxParts_shouldTruncate() -> Result<()> {
    let options = ScriptConfig {
        narrate_title: false,
        max_parts: Some(1),
        ..ScriptConfig::default()
    };

    let script = ScriptDocument::from_json_str(common::sample_script_json(), &options)?;
    assert_eq!(script.parts.len(), 1);
    assert_eq!(script.parts[0].name, "article_1");
    Ok(())
}

#[test]
fn test_fromJsonStr_withNoParts_shouldFail() {
    let options = ScriptConfig::default();
    assert!(ScriptDocument::from_json_str(r#"{"title": "x", "content": {"script_parts": []}}"#, &options).is_err());
    assert!(ScriptDocument::from_json_str("[]", &options).is_err());
}

#[test]
fn test_resolveSpeaker_shouldUseNarratorForArticles() {
    let article = ScriptPart::new(0, "article_3", "本文").with_speaker(8);
    let reaction = ScriptPart::new(1, "reaction", "感想").with_speaker(1);
    let unnamed = ScriptPart::new(2, "closing", "締め");

    assert_eq!(article.resolve_speaker(3), 3);
    assert_eq!(reaction.resolve_speaker(3), 1);
    assert_eq!(unnamed.resolve_speaker(3), 3);
}

#[test]
fn test_fromParts_withDuplicateIndex_shouldFail() {
    let parts = vec![ScriptPart::new(0, "a", "x"), ScriptPart::new(0, "b", "y")];
    assert!(ScriptDocument::from_parts(None, parts).is_err());
}
