/*!
 * Tests for duration aggregation
 */

use voxline::aggregator::{ChunkDuration, DurationAggregator, DurationSource};
use voxline::chunker::{Chunk, Chunker};
use voxline::errors::TimelineError;
use voxline::estimator::DurationEstimator;
use voxline::script::{ScriptDocument, ScriptPart};

#[test]
fn test_chunkDuration_shouldRoundOnceToMilliseconds() {
    let duration = ChunkDuration::measured(0, 0, 2.0004).unwrap();
    assert_eq!(duration.millis(), 2000);
    assert_eq!(duration.seconds(), 2.0);

    let duration = ChunkDuration::estimated(0, 1, 0.0016).unwrap();
    assert_eq!(duration.millis(), 2);
    assert!(duration.is_estimated());
}

#[test]
fn test_chunkDuration_withInvalidSeconds_shouldFail() {
    for seconds in [0.0, -0.5, f64::NAN, f64::INFINITY, 0.0004] {
        let result = ChunkDuration::measured(3, 1, seconds);
        assert!(
            matches!(
                result,
                Err(TimelineError::InvalidDuration {
                    part_index: 3,
                    chunk_index: 1,
                    ..
                })
            ),
            "{seconds} should be rejected"
        );
    }
}

#[test]
fn test_record_inAnyOrder_shouldFinalizeSorted() {
    let mut aggregator = DurationAggregator::new();
    aggregator.expect_part(1, 2);
    aggregator.expect_part(0, 3);

    for (part, chunk, seconds) in [(1, 1, 2.1), (0, 2, 1.8), (0, 0, 1.5), (1, 0, 2.5), (0, 1, 2.3)] {
        aggregator.record(ChunkDuration::measured(part, chunk, seconds).unwrap()).unwrap();
    }
    assert!(aggregator.is_complete());

    let finalized = aggregator.finalize().unwrap();
    let layout: Vec<(usize, Vec<u64>)> = finalized
        .parts()
        .iter()
        .map(|p| (p.part_index, p.durations.iter().map(|d| d.millis()).collect()))
        .collect();

    assert_eq!(layout, vec![(0, vec![1500, 2300, 1800]), (1, vec![2500, 2100])]);
    assert_eq!(finalized.total_chunks(), 5);
    assert_eq!(finalized.total_millis(), 10_200);
}

#[test]
fn test_record_withDuplicate_shouldFailWithDuplicateChunk() {
    let mut aggregator = DurationAggregator::new();
    aggregator.expect_part(0, 2);
    aggregator.record(ChunkDuration::measured(0, 1, 1.0).unwrap()).unwrap();

    let result = aggregator.record(ChunkDuration::measured(0, 1, 1.2).unwrap());
    assert_eq!(
        result,
        Err(TimelineError::DuplicateChunk {
            part_index: 0,
            chunk_index: 1
        })
    );
    assert_eq!(aggregator.part_durations(0)[0].millis(), 1000);
}

#[test]
fn test_record_withUndeclaredChunk_shouldFailWithUnexpectedChunk() {
    let mut aggregator = DurationAggregator::new();
    aggregator.expect_part(0, 2);

    assert!(matches!(
        aggregator.record(ChunkDuration::measured(0, 2, 1.0).unwrap()),
        Err(TimelineError::UnexpectedChunk { .. })
    ));
    assert!(matches!(
        aggregator.record(ChunkDuration::measured(7, 0, 1.0).unwrap()),
        Err(TimelineError::UnexpectedChunk { part_index: 7, .. })
    ));
    assert_eq!(aggregator.recorded_count(), 0);
}

#[test]
fn test_finalize_withGap_shouldNameFirstMissingChunk() {
    let mut aggregator = DurationAggregator::new();
    aggregator.expect_part(0, 3);
    aggregator.record(ChunkDuration::measured(0, 0, 1.0).unwrap()).unwrap();
    aggregator.record(ChunkDuration::measured(0, 2, 1.0).unwrap()).unwrap();

    assert!(!aggregator.is_complete());
    assert_eq!(
        aggregator.finalize().unwrap_err(),
        TimelineError::MissingChunk {
            part_index: 0,
            chunk_index: 1
        }
    );
}

#[test]
fn test_recordOutcome_withoutMeasurement_shouldUseEstimator() {
    let estimator = DurationEstimator::default();
    let script = ScriptDocument::from_parts(None, vec![ScriptPart::new(0, "reaction", "こんにちは。")]).unwrap();
    let chunked = Chunker::new(45, 15).chunk_script(&script).unwrap();
    let mut aggregator = DurationAggregator::from_chunked(&chunked);

    let chunk: &Chunk = chunked.chunk(0, 0).unwrap();
    let source = aggregator.record_outcome(chunk, None, &estimator).unwrap();

    assert_eq!(source, DurationSource::Estimated);
    let recorded = aggregator.part_durations(0)[0];
    let expected_ms = (estimator.estimate("こんにちは。") * 1000.0).round() as u64;
    assert_eq!(recorded.millis(), expected_ms);
    assert_eq!(recorded.source(), DurationSource::Estimated);
}

#[test]
fn test_recordOutcome_withMeasuredZero_shouldNotFallBack() {
    let estimator = DurationEstimator::default();
    let chunk = Chunk {
        part_index: 0,
        chunk_index: 0,
        text: "テスト".to_string(),
    };
    let mut aggregator = DurationAggregator::new();
    aggregator.expect_part(0, 1);

    assert!(matches!(
        aggregator.record_outcome(&chunk, Some(0.0), &estimator),
        Err(TimelineError::InvalidDuration { .. })
    ));
    assert_eq!(aggregator.recorded_count(), 0);
}

#[test]
fn test_durationSource_shouldSerializeLowercase() {
    assert_eq!(serde_json::to_string(&DurationSource::Measured).unwrap(), "\"measured\"");
    assert_eq!(DurationSource::Estimated.to_string(), "estimated");
}
