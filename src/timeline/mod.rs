/*!
 * The global narration timeline.
 *
 * A [`Timeline`] holds one [`TimelineEntry`] per chunk, laid end to end on a
 * single time axis that starts at zero. Times are whole milliseconds; the
 * `*_seconds` accessors are for display and export only.
 *
 * - `builder`: builds a timeline from finalized durations
 * - `query`: read-only lookups used while composing the video
 * - `export`: JSON, SRT and diagnostics output
 */

use serde::Serialize;
use std::collections::HashMap;

use crate::aggregator::DurationSource;

pub mod builder;
pub mod export;
pub mod query;

pub use builder::TimelineBuilder;
pub use export::{format_srt_timestamp, SubtitleCue};
pub use query::{ChunkDiagnostic, SyncDiagnostics};

/// Scheduling record of one chunk on the global timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub part_index: usize,
    pub chunk_index: usize,
    /// Inclusive start, in milliseconds from the beginning of the narration
    pub start_ms: u64,
    /// Exclusive end
    pub end_ms: u64,
    pub source: DurationSource,
}

impl TimelineEntry {
    pub fn start_seconds(&self) -> f64 {
        millis_to_seconds(self.start_ms)
    }

    pub fn end_seconds(&self) -> f64 {
        millis_to_seconds(self.end_ms)
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    pub fn duration_seconds(&self) -> f64 {
        millis_to_seconds(self.duration_ms())
    }

    /// Whether `ms` falls inside `[start, end)`
    pub fn contains_ms(&self, ms: u64) -> bool {
        self.start_ms <= ms && ms < self.end_ms
    }
}

/// Where one part sits on the global timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpan {
    pub part_index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub chunk_count: usize,
    /// Chunks of this part whose duration was estimated
    pub estimated_count: usize,
    // Position of the part's first entry in the entry list
    first_entry: usize,
}

impl PartSpan {
    pub fn start_seconds(&self) -> f64 {
        millis_to_seconds(self.start_ms)
    }

    pub fn end_seconds(&self) -> f64 {
        millis_to_seconds(self.end_ms)
    }

    pub fn duration_seconds(&self) -> f64 {
        millis_to_seconds(self.end_ms - self.start_ms)
    }

    pub fn is_fully_estimated(&self) -> bool {
        self.estimated_count == self.chunk_count
    }
}

/// Immutable, contiguous schedule of every chunk in narration order.
///
/// Built once per run by [`TimelineBuilder`] and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    parts: Vec<PartSpan>,
    entry_lookup: HashMap<(usize, usize), usize>,
    part_lookup: HashMap<usize, usize>,
    total_ms: u64,
}

impl Timeline {
    // Callers pass entries in (part, chunk) order, laid end to end from zero
    fn from_entries(entries: Vec<TimelineEntry>) -> Self {
        let mut parts: Vec<PartSpan> = Vec::new();

        for (position, entry) in entries.iter().enumerate() {
            let estimated = usize::from(entry.source == DurationSource::Estimated);
            match parts.last_mut() {
                Some(span) if span.part_index == entry.part_index => {
                    span.end_ms = entry.end_ms;
                    span.chunk_count += 1;
                    span.estimated_count += estimated;
                }
                _ => parts.push(PartSpan {
                    part_index: entry.part_index,
                    start_ms: entry.start_ms,
                    end_ms: entry.end_ms,
                    chunk_count: 1,
                    estimated_count: estimated,
                    first_entry: position,
                }),
            }
        }

        let entry_lookup = entries
            .iter()
            .enumerate()
            .map(|(position, e)| ((e.part_index, e.chunk_index), position))
            .collect();
        let part_lookup = parts
            .iter()
            .enumerate()
            .map(|(position, p)| (p.part_index, position))
            .collect();
        let total_ms = entries.last().map_or(0, |e| e.end_ms);

        Self {
            entries,
            parts,
            entry_lookup,
            part_lookup,
            total_ms,
        }
    }
}

pub(crate) fn millis_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
