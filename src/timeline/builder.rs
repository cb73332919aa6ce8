use log::debug;

use crate::aggregator::FinalizedDurations;
use crate::errors::TimelineError;
use crate::timeline::{Timeline, TimelineEntry};

/// Lays chunk durations end to end on one time axis
pub struct TimelineBuilder;

impl TimelineBuilder {
    /// Build the global timeline.
    ///
    /// A cursor starts at zero; every chunk, in part then chunk order, starts
    /// where the previous one ended. All arithmetic is on whole milliseconds,
    /// so the total is exactly the sum of the chunk durations.
    pub fn build(durations: &FinalizedDurations) -> Result<Timeline, TimelineError> {
        let total_chunks = durations.total_chunks();
        if durations.parts().is_empty() || total_chunks == 0 {
            return Err(TimelineError::EmptyTimeline);
        }

        let mut entries = Vec::with_capacity(total_chunks);
        let mut cursor_ms: u64 = 0;

        for part in durations.parts() {
            if part.durations.is_empty() {
                debug!("Part {} has no chunks, leaving it off the timeline", part.part_index);
                continue;
            }

            let part_start = cursor_ms;
            for duration in &part.durations {
                let end_ms = cursor_ms + duration.millis();
                entries.push(TimelineEntry {
                    part_index: part.part_index,
                    chunk_index: duration.chunk_index(),
                    start_ms: cursor_ms,
                    end_ms,
                    source: duration.source(),
                });
                cursor_ms = end_ms;
            }

            debug!(
                "Part {}: {} chunks at {}ms..{}ms",
                part.part_index,
                part.durations.len(),
                part_start,
                cursor_ms
            );
        }

        Ok(Timeline::from_entries(entries))
    }
}
