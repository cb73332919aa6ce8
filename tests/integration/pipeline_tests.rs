/*!
 * Integration tests for full timeline runs against the mock synthesizer
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use voxline::aggregator::DurationSource;
use voxline::app_config::Config;
use voxline::errors::PipelineError;
use voxline::estimator::DurationEstimator;
use voxline::pipeline::TimelinePipeline;
use voxline::script::ScriptDocument;
use voxline::synthesis::mock::MockSynthesizer;
use voxline::synthesis::DryRunSynthesizer;

use crate::common;

fn test_config() -> Config {
    let mut config = Config::default();
    config.chunking.max_chars = 12;
    config.chunking.min_merge_chars = 0;
    config.synthesis.concurrent_requests = 3;
    config
}

fn sample_script() -> Result<ScriptDocument> {
    ScriptDocument::from_json_str(common::sample_script_json(), &test_config().script)
}

/// Test that the completion order of synthesis calls never shows in the timeline
#[tokio::test]
async fn test_run_withJitteredCompletion_shouldProduceIdenticalTimelines() -> Result<()> {
    common::init_test_logger();
    let script = sample_script()?;

    let mut documents = Vec::new();
    for _ in 0..3 {
        let mock = MockSynthesizer::jittered(15);
        let pipeline = TimelinePipeline::new(&test_config(), Arc::new(mock));
        let output = pipeline.run(&script, |_, _| {}).await?;
        documents.push(output.timeline.to_json(Some(&output.chunked))?);
    }

    assert_eq!(documents[0], documents[1]);
    assert_eq!(documents[1], documents[2]);
    Ok(())
}

#[tokio::test]
async fn test_run_shouldPlaceEveryChunkExactlyOnce() -> Result<()> {
    let script = sample_script()?;
    let mock = MockSynthesizer::reversed(30);
    let pipeline = TimelinePipeline::new(&test_config(), Arc::new(mock.clone()));

    let output = pipeline.run(&script, |_, _| {}).await?;

    let total = output.chunked.total_chunks();
    assert_eq!(output.timeline.len(), total);
    assert_eq!(mock.request_count(), total);
    assert_eq!(output.timeline.total_ms(), total as u64 * 1000);
    for chunk in output.chunked.chunks() {
        let entry = output.timeline.entry(chunk.part_index, chunk.chunk_index)?;
        assert_eq!(entry.duration_ms(), 1000);
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withDryRunSynthesizer_shouldEstimateEverything() -> Result<()> {
    let script = sample_script()?;
    let pipeline = TimelinePipeline::new(&test_config(), Arc::new(DryRunSynthesizer));
    let estimator = DurationEstimator::from_config(&test_config().estimator);

    let output = pipeline.run(&script, |_, _| {}).await?;

    let diagnostics = output.timeline.diagnostics();
    assert_eq!(diagnostics.measured_count, 0);
    assert_eq!(diagnostics.estimated_ratio(), 1.0);
    assert!(output.audio_files.is_empty());

    let expected_total: u64 = output
        .chunked
        .chunks()
        .map(|c| (estimator.estimate(&c.text) * 1000.0).round() as u64)
        .sum();
    assert_eq!(output.timeline.total_ms(), expected_total);
    Ok(())
}

#[tokio::test]
async fn test_run_withMixedSources_shouldKeepMeasuredEntriesExact() -> Result<()> {
    let script = sample_script()?;
    let mock = MockSynthesizer::measured(1.25).with_duration(1, 0, None);
    let pipeline = TimelinePipeline::new(&test_config(), Arc::new(mock));

    let output = pipeline.run(&script, |_, _| {}).await?;

    let estimated = output.timeline.entry(1, 0)?;
    assert_eq!(estimated.source, DurationSource::Estimated);
    for entry in output.timeline.entries() {
        if entry.source == DurationSource::Measured {
            assert_eq!(entry.duration_ms(), 1250);
        }
    }
    assert_eq!(output.timeline.diagnostics().estimated_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_run_withHardFailure_shouldNotBuildTimeline() -> Result<()> {
    let script = sample_script()?;
    let mock = MockSynthesizer::measured(1.0).with_failure(2, 1);
    let pipeline = TimelinePipeline::new(&test_config(), Arc::new(mock));

    let result = pipeline.run(&script, |_, _| {}).await;

    match result {
        Err(PipelineError::Synthesis {
            part_index,
            chunk_index,
            ..
        }) => assert_eq!((part_index, chunk_index), (2, 1)),
        other => panic!("expected a synthesis failure, got {:?}", other.map(|o| o.timeline.len())),
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withStalledSynthesizer_shouldTimeOutInsteadOfHanging() -> Result<()> {
    let script = sample_script()?;
    let pipeline = TimelinePipeline::new(&test_config(), Arc::new(MockSynthesizer::slow(5_000)))
        .with_timeout(Duration::from_millis(50));

    let started = std::time::Instant::now();
    let result = pipeline.run(&script, |_, _| {}).await;

    assert!(matches!(result, Err(PipelineError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}
