/*!
 * Per-run collection of chunk durations.
 *
 * A [`DurationAggregator`] is created by the call that orchestrates one run,
 * told how many chunks every part has, and then fed one [`ChunkDuration`] per
 * chunk in whatever order synthesis calls complete. [`DurationAggregator::finalize`]
 * is the barrier in front of the timeline builder: it only succeeds when every
 * expected chunk has exactly one duration, and it hands back the durations
 * sorted by part and chunk index.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::chunker::{Chunk, ChunkedScript};
use crate::errors::TimelineError;
use crate::estimator::DurationEstimator;

/// Longest accepted chunk duration, in milliseconds (24 hours)
pub const MAX_CHUNK_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// Where a chunk duration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationSource {
    /// Read from the synthesized audio artifact
    Measured,
    /// Computed from the chunk text by the fallback estimator
    Estimated,
}

impl fmt::Display for DurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured => write!(f, "measured"),
            Self::Estimated => write!(f, "estimated"),
        }
    }
}

/// Spoken length of one chunk.
///
/// The duration is rounded to whole milliseconds once, here, and never
/// re-derived afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDuration {
    part_index: usize,
    chunk_index: usize,
    millis: u64,
    source: DurationSource,
}

impl ChunkDuration {
    /// Create a duration from seconds. Fails for zero, negative or non-finite
    /// values, for values that round to zero milliseconds and for anything
    /// longer than [`MAX_CHUNK_MILLIS`]. The upper bound keeps the
    /// millisecond sums of a timeline inside `u64`.
    pub fn new(
        part_index: usize,
        chunk_index: usize,
        seconds: f64,
        source: DurationSource,
    ) -> Result<Self, TimelineError> {
        let invalid = TimelineError::InvalidDuration {
            part_index,
            chunk_index,
            seconds,
        };
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(invalid);
        }

        let millis = (seconds * 1000.0).round();
        if millis < 1.0 || millis > MAX_CHUNK_MILLIS as f64 {
            return Err(invalid);
        }

        Ok(Self {
            part_index,
            chunk_index,
            millis: millis as u64,
            source,
        })
    }

    pub fn measured(part_index: usize, chunk_index: usize, seconds: f64) -> Result<Self, TimelineError> {
        Self::new(part_index, chunk_index, seconds, DurationSource::Measured)
    }

    pub fn estimated(part_index: usize, chunk_index: usize, seconds: f64) -> Result<Self, TimelineError> {
        Self::new(part_index, chunk_index, seconds, DurationSource::Estimated)
    }

    pub fn part_index(&self) -> usize {
        self.part_index
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    pub fn source(&self) -> DurationSource {
        self.source
    }

    pub fn is_estimated(&self) -> bool {
        self.source == DurationSource::Estimated
    }
}

/// Ordered durations of one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDurations {
    pub part_index: usize,
    pub durations: Vec<ChunkDuration>,
}

impl PartDurations {
    pub fn total_millis(&self) -> u64 {
        self.durations.iter().map(ChunkDuration::millis).sum()
    }
}

/// Complete duration data for a run, sorted by part then chunk index.
///
/// Only [`DurationAggregator::finalize`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedDurations {
    parts: Vec<PartDurations>,
}

impl FinalizedDurations {
    pub fn parts(&self) -> &[PartDurations] {
        &self.parts
    }

    pub fn total_chunks(&self) -> usize {
        self.parts.iter().map(|p| p.durations.len()).sum()
    }

    pub fn total_millis(&self) -> u64 {
        self.parts.iter().map(PartDurations::total_millis).sum()
    }
}

/// Collects chunk durations for one run
#[derive(Debug, Default)]
pub struct DurationAggregator {
    // part_index -> expected chunk count
    expected: BTreeMap<usize, usize>,
    recorded: HashMap<(usize, usize), ChunkDuration>,
}

impl DurationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator expecting exactly the chunks of `script`
    pub fn from_chunked(script: &ChunkedScript) -> Self {
        let mut aggregator = Self::new();
        for (part_index, count) in script.expected_counts() {
            aggregator.expect_part(part_index, count);
        }
        aggregator
    }

    /// Declare that `part_index` has chunks `0..chunk_count`
    pub fn expect_part(&mut self, part_index: usize, chunk_count: usize) {
        if let Some(previous) = self.expected.insert(part_index, chunk_count) {
            if previous != chunk_count {
                warn!(
                    "Part {} expected chunk count changed from {} to {}",
                    part_index, previous, chunk_count
                );
                self.recorded
                    .retain(|&(part, chunk), _| part != part_index || chunk < chunk_count);
            }
        }
    }

    /// Record one chunk's duration. Chunks may arrive in any order.
    pub fn record(&mut self, duration: ChunkDuration) -> Result<(), TimelineError> {
        let key = (duration.part_index, duration.chunk_index);

        match self.expected.get(&duration.part_index) {
            Some(&count) if duration.chunk_index < count => {}
            _ => {
                return Err(TimelineError::UnexpectedChunk {
                    part_index: key.0,
                    chunk_index: key.1,
                })
            }
        }

        if self.recorded.contains_key(&key) {
            return Err(TimelineError::DuplicateChunk {
                part_index: key.0,
                chunk_index: key.1,
            });
        }

        self.recorded.insert(key, duration);
        Ok(())
    }

    /// Record the synthesis result for `chunk`.
    ///
    /// A measurement is recorded as-is; a missing measurement is replaced with
    /// the estimator's duration. Returns the source that was recorded.
    pub fn record_outcome(
        &mut self,
        chunk: &Chunk,
        measured_seconds: Option<f64>,
        estimator: &DurationEstimator,
    ) -> Result<DurationSource, TimelineError> {
        let duration = match measured_seconds {
            Some(seconds) => ChunkDuration::measured(chunk.part_index, chunk.chunk_index, seconds)?,
            None => {
                let seconds = estimator.estimate(&chunk.text);
                warn!(
                    "No measured duration for part {}, chunk {}; estimated {:.3}s from text",
                    chunk.part_index, chunk.chunk_index, seconds
                );
                ChunkDuration::estimated(chunk.part_index, chunk.chunk_index, seconds)?
            }
        };

        let source = duration.source();
        self.record(duration)?;
        debug!(
            "Recorded {} duration {}ms for part {}, chunk {}",
            source,
            duration.millis(),
            chunk.part_index,
            chunk.chunk_index
        );
        Ok(source)
    }

    /// Durations recorded so far for a part, in ascending chunk order
    pub fn part_durations(&self, part_index: usize) -> Vec<ChunkDuration> {
        let count = self.expected.get(&part_index).copied().unwrap_or(0);
        (0..count)
            .filter_map(|chunk_index| self.recorded.get(&(part_index, chunk_index)).copied())
            .collect()
    }

    pub fn recorded_count(&self) -> usize {
        self.recorded.len()
    }

    pub fn expected_count(&self) -> usize {
        self.expected.values().sum()
    }

    pub fn is_complete(&self) -> bool {
        self.recorded_count() == self.expected_count()
    }

    /// Check that every expected chunk has a duration and return the sorted data
    pub fn finalize(mut self) -> Result<FinalizedDurations, TimelineError> {
        let mut parts = Vec::with_capacity(self.expected.len());

        for (&part_index, &count) in &self.expected {
            let mut durations = Vec::with_capacity(count);
            for chunk_index in 0..count {
                match self.recorded.remove(&(part_index, chunk_index)) {
                    Some(duration) => durations.push(duration),
                    None => {
                        return Err(TimelineError::MissingChunk {
                            part_index,
                            chunk_index,
                        })
                    }
                }
            }
            parts.push(PartDurations {
                part_index,
                durations,
            });
        }

        Ok(FinalizedDurations { parts })
    }
}
