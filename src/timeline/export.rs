/*!
 * Timeline output formats.
 *
 * - JSON timeline document consumed by video composition
 * - SRT subtitles, one cue per chunk
 * - Plain-text sync diagnostics for operators
 *
 * Every format is produced from the timeline's ordered vectors only, so
 * exporting the same timeline twice gives byte-identical output.
 */

use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;

use crate::aggregator::DurationSource;
use crate::chunker::ChunkedScript;
use crate::errors::TimelineError;
use crate::timeline::{millis_to_seconds, Timeline};

/// One SRT subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    /// Sequence number, starting at 1
    pub seq_num: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl SubtitleCue {
    pub fn format_start_time(&self) -> String {
        format_srt_timestamp(self.start_ms)
    }

    pub fn format_end_time(&self) -> String {
        format_srt_timestamp(self.end_ms)
    }
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Format a timestamp in milliseconds as `HH:MM:SS,mmm`
pub fn format_srt_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineDocument<'a> {
    total_seconds: f64,
    total_ms: u64,
    chunk_count: usize,
    estimated_count: usize,
    parts: Vec<PartRecord>,
    entries: Vec<EntryRecord<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartRecord {
    part_index: usize,
    offset_seconds: f64,
    offset_ms: u64,
    end_seconds: f64,
    end_ms: u64,
    chunk_count: usize,
    estimated_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord<'a> {
    part_index: usize,
    chunk_index: usize,
    start_seconds: f64,
    end_seconds: f64,
    start_ms: u64,
    end_ms: u64,
    source: DurationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl Timeline {
    /// Pretty-printed JSON timeline document.
    ///
    /// Chunk texts are included when `script` is given.
    pub fn to_json(&self, script: Option<&ChunkedScript>) -> serde_json::Result<String> {
        let entries = self
            .entries
            .iter()
            .map(|e| EntryRecord {
                part_index: e.part_index,
                chunk_index: e.chunk_index,
                start_seconds: e.start_seconds(),
                end_seconds: e.end_seconds(),
                start_ms: e.start_ms,
                end_ms: e.end_ms,
                source: e.source,
                text: script
                    .and_then(|s| s.chunk(e.part_index, e.chunk_index))
                    .map(|c| c.text.as_str()),
            })
            .collect();

        let parts = self
            .parts
            .iter()
            .map(|p| PartRecord {
                part_index: p.part_index,
                offset_seconds: p.start_seconds(),
                offset_ms: p.start_ms,
                end_seconds: p.end_seconds(),
                end_ms: p.end_ms,
                chunk_count: p.chunk_count,
                estimated_count: p.estimated_count,
            })
            .collect();

        let document = TimelineDocument {
            total_seconds: self.total_seconds(),
            total_ms: self.total_ms,
            chunk_count: self.entries.len(),
            estimated_count: self.parts.iter().map(|p| p.estimated_count).sum(),
            parts,
            entries,
        };

        serde_json::to_string_pretty(&document)
    }

    /// One subtitle cue per chunk, numbered from 1 in timeline order
    pub fn subtitle_cues(&self, script: &ChunkedScript) -> Result<Vec<SubtitleCue>, TimelineError> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let chunk = script
                    .chunk(e.part_index, e.chunk_index)
                    .ok_or(TimelineError::NotFound {
                        part_index: e.part_index,
                        chunk_index: Some(e.chunk_index),
                    })?;
                Ok(SubtitleCue {
                    seq_num: i + 1,
                    start_ms: e.start_ms,
                    end_ms: e.end_ms,
                    text: chunk.text.clone(),
                })
            })
            .collect()
    }

    /// SRT subtitle file content
    pub fn to_srt(&self, script: &ChunkedScript) -> Result<String, TimelineError> {
        let mut content = String::new();
        for cue in self.subtitle_cues(script)? {
            content.push_str(&cue.to_string());
        }
        Ok(content)
    }

    /// Human-readable report of where durations were estimated
    pub fn diagnostics_report(&self) -> String {
        let diagnostics = self.diagnostics();
        let mut report = String::new();

        let _ = writeln!(
            report,
            "Total: {} ({:.3}s), {} chunks: {} measured, {} estimated ({:.1}%)",
            format_srt_timestamp(self.total_ms),
            self.total_seconds(),
            self.entries.len(),
            diagnostics.measured_count,
            diagnostics.estimated_count,
            diagnostics.estimated_ratio() * 100.0
        );
        let _ = writeln!(report);

        for part in &self.parts {
            let marker = if part.estimated_count > 0 { " *" } else { "" };
            let _ = writeln!(
                report,
                "Part {}: {} --> {}, {} chunks, {} estimated{}",
                part.part_index,
                format_srt_timestamp(part.start_ms),
                format_srt_timestamp(part.end_ms),
                part.chunk_count,
                part.estimated_count,
                marker
            );
        }

        if diagnostics.is_fully_measured() {
            let _ = writeln!(report, "\nAll chunk durations were measured.");
            return report;
        }

        let _ = writeln!(
            report,
            "\nEstimated chunks ({:.3}s of narration):",
            millis_to_seconds(diagnostics.estimated_ms)
        );
        for chunk in diagnostics.estimated_chunks() {
            let _ = writeln!(
                report,
                "  part {}, chunk {}: {:.3}s",
                chunk.part_index,
                chunk.chunk_index,
                millis_to_seconds(chunk.duration_ms)
            );
        }

        report
    }
}
