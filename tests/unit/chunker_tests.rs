/*!
 * Tests for narration chunking
 */

use anyhow::Result;
use voxline::app_config::ScriptConfig;
use voxline::chunker::Chunker;
use voxline::errors::TimelineError;
use voxline::script::{ScriptDocument, ScriptPart};

use crate::common;

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn test_splitText_withSentences_shouldCutAtTerminators() {
    let chunker = Chunker::new(20, 0);
    let chunks = chunker
        .split_text(0, "今日は晴れです。明日は雨でしょう。週末は曇りの予報です。")
        .unwrap();

    assert_eq!(chunks, vec!["今日は晴れです。", "明日は雨でしょう。", "週末は曇りの予報です。"]);
}

#[test]
fn test_splitText_withShortSentence_shouldMergeWithNext() {
    let chunker = Chunker::new(20, 10);
    let chunks = chunker
        .split_text(0, "今日は晴れです。明日は雨でしょう。週末は曇りの予報です。")
        .unwrap();

    assert_eq!(chunks, vec!["今日は晴れです。明日は雨でしょう。", "週末は曇りの予報です。"]);
}

#[test]
fn test_splitText_withLongSentence_shouldFallBackToClauses() {
    let chunker = Chunker::new(10, 0);
    let chunks = chunker.split_text(0, "東京、大阪、名古屋、福岡で雨です。").unwrap();

    assert_eq!(chunks, vec!["東京、大阪、名古屋、", "福岡で雨です。"]);
}

#[test]
fn test_splitText_withLatinText_shouldPackWords() {
    let chunker = Chunker::new(12, 0);
    let chunks = chunker
        .split_text(0, "The quick brown fox jumps over the lazy dog")
        .unwrap();

    assert_eq!(chunks, vec!["The quick", "brown fox", "jumps over", "the lazy dog"]);
}

#[test]
fn test_splitText_withUnbrokenRun_shouldHardCut() {
    let chunker = Chunker::new(4, 0);
    let chunks = chunker.split_text(0, "ああああああああああ").unwrap();

    assert_eq!(chunks, vec!["ああああ", "ああああ", "ああ"]);
}

#[test]
fn test_chunkPart_withBlankText_shouldFailWithInvalidInput() {
    let chunker = Chunker::new(45, 15);
    let result = chunker.chunk_part(&ScriptPart::new(5, "reaction", " \n\t "));

    assert!(matches!(result, Err(TimelineError::InvalidInput { part_index: 5, .. })));
}

#[test]
fn test_chunkScript_withSampleScript_shouldPreserveTextAndBounds() -> Result<()> {
    let chunker = Chunker::new(12, 6);
    let script = ScriptDocument::from_json_str(common::sample_script_json(), &ScriptConfig::default())?;

    let chunked = chunker.chunk_script(&script)?;

    assert_eq!(chunked.parts().len(), script.parts.len());
    for part in &script.parts {
        let chunked_part = chunked.part(part.part_index).expect("part was chunked");
        let joined: String = chunked_part.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(without_whitespace(&joined), without_whitespace(&part.text));

        for (i, chunk) in chunked_part.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.part_index, part.part_index);
            assert!(!chunk.text.is_empty());
            assert!(chunk.text.chars().count() <= 12, "chunk too long: {}", chunk.text);
        }
    }

    let counts = chunked.expected_counts();
    assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), chunked.total_chunks());
    assert_eq!(chunked.chunks().count(), chunked.total_chunks());
    Ok(())
}

#[test]
fn test_chunkScript_withSparseParts_shouldKeepPartIndices() -> Result<()> {
    let chunker = Chunker::new(45, 15);
    let script = ScriptDocument::from_parts(
        None,
        vec![ScriptPart::new(4, "reaction", "最後です。"), ScriptPart::new(1, "article_1", "最初です。")],
    )?;

    let chunked = chunker.chunk_script(&script)?;

    assert_eq!(chunked.expected_counts(), vec![(1, 1), (4, 1)]);
    assert_eq!(chunked.chunk(4, 0).map(|c| c.text.as_str()), Some("最後です。"));
    assert!(chunked.chunk(2, 0).is_none());
    Ok(())
}
