use serde::Serialize;

use crate::aggregator::DurationSource;
use crate::errors::TimelineError;
use crate::timeline::{millis_to_seconds, PartSpan, Timeline, TimelineEntry};

/// Duration source of one chunk, for auditing sync accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDiagnostic {
    pub part_index: usize,
    pub chunk_index: usize,
    pub source: DurationSource,
    pub duration_ms: u64,
}

/// Which chunks were measured and which were estimated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDiagnostics {
    pub measured_count: usize,
    pub estimated_count: usize,
    /// Total time covered by estimated chunks
    pub estimated_ms: u64,
    pub chunks: Vec<ChunkDiagnostic>,
}

impl SyncDiagnostics {
    pub fn is_fully_measured(&self) -> bool {
        self.estimated_count == 0
    }

    /// Share of chunks whose duration was estimated, in `0.0..=1.0`
    pub fn estimated_ratio(&self) -> f64 {
        let total = self.measured_count + self.estimated_count;
        if total == 0 {
            0.0
        } else {
            self.estimated_count as f64 / total as f64
        }
    }

    pub fn estimated_chunks(&self) -> impl Iterator<Item = &ChunkDiagnostic> {
        self.chunks
            .iter()
            .filter(|c| c.source == DurationSource::Estimated)
    }
}

impl Timeline {
    /// All entries in narration order
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for one chunk
    pub fn entry(&self, part_index: usize, chunk_index: usize) -> Result<&TimelineEntry, TimelineError> {
        self.entry_lookup
            .get(&(part_index, chunk_index))
            .map(|&position| &self.entries[position])
            .ok_or(TimelineError::NotFound {
                part_index,
                chunk_index: Some(chunk_index),
            })
    }

    /// Placement of one part
    pub fn part_span(&self, part_index: usize) -> Result<&PartSpan, TimelineError> {
        self.part_lookup
            .get(&part_index)
            .map(|&position| &self.parts[position])
            .ok_or(TimelineError::NotFound {
                part_index,
                chunk_index: None,
            })
    }

    /// Start of a part on the global timeline, in milliseconds
    pub fn part_offset_ms(&self, part_index: usize) -> Result<u64, TimelineError> {
        self.part_span(part_index).map(|span| span.start_ms)
    }

    /// Start of a part on the global timeline, in seconds.
    ///
    /// Used to splice a per-part audio clip onto the shared track.
    pub fn part_offset(&self, part_index: usize) -> Result<f64, TimelineError> {
        self.part_offset_ms(part_index).map(millis_to_seconds)
    }

    /// Entries of one part, in chunk order
    pub fn part_entries(&self, part_index: usize) -> Result<&[TimelineEntry], TimelineError> {
        let span = self.part_span(part_index)?;
        Ok(&self.entries[span.first_entry..span.first_entry + span.chunk_count])
    }

    /// Every part span, in narration order
    pub fn parts(&self) -> &[PartSpan] {
        &self.parts
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn total_seconds(&self) -> f64 {
        millis_to_seconds(self.total_ms)
    }

    /// Entry playing at `ms`, if any. `[start, end)` semantics, so the end of
    /// the narration belongs to no entry.
    pub fn entry_at_ms(&self, ms: u64) -> Option<&TimelineEntry> {
        let position = self.entries.partition_point(|e| e.end_ms <= ms);
        self.entries
            .get(position)
            .filter(|entry| entry.contains_ms(ms))
    }

    /// Entry playing at `seconds`, if any
    pub fn entry_at(&self, seconds: f64) -> Option<&TimelineEntry> {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        // Nudge past binary representation error, e.g. 10.2 * 1000.0 < 10200.0
        self.entry_at_ms((seconds * 1000.0 + 1e-6).floor() as u64)
    }

    /// Per-chunk duration sources
    pub fn diagnostics(&self) -> SyncDiagnostics {
        let chunks: Vec<ChunkDiagnostic> = self
            .entries
            .iter()
            .map(|e| ChunkDiagnostic {
                part_index: e.part_index,
                chunk_index: e.chunk_index,
                source: e.source,
                duration_ms: e.duration_ms(),
            })
            .collect();

        let estimated: Vec<&ChunkDiagnostic> = chunks
            .iter()
            .filter(|c| c.source == DurationSource::Estimated)
            .collect();
        let estimated_count = estimated.len();
        let estimated_ms = estimated.iter().map(|c| c.duration_ms).sum();

        SyncDiagnostics {
            measured_count: chunks.len() - estimated_count,
            estimated_count,
            estimated_ms,
            chunks,
        }
    }
}
