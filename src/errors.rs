/*!
 * Error types for the voxline library.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised while chunking, aggregating, building or querying a timeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// Part text is empty or malformed at chunking time
    #[error("Invalid input for part {part_index}: {message}")]
    InvalidInput {
        /// Part whose text was rejected
        part_index: usize,
        /// What was wrong with it
        message: String,
    },

    /// Finalization found a gap in the expected chunk indices of a part
    #[error("Missing duration for part {part_index}, chunk {chunk_index}")]
    MissingChunk {
        part_index: usize,
        chunk_index: usize,
    },

    /// No parts or no chunks reached the builder
    #[error("Cannot build a timeline from zero parts or zero chunks")]
    EmptyTimeline,

    /// A query asked for something that was never in the built timeline
    #[error("{}", not_found_message(.part_index, .chunk_index))]
    NotFound {
        part_index: usize,
        /// `None` when a whole part was requested
        chunk_index: Option<usize>,
    },

    /// A duration that is not finite, rounds to 0 ms or exceeds the per-chunk maximum
    #[error("Invalid duration {seconds}s for part {part_index}, chunk {chunk_index}")]
    InvalidDuration {
        part_index: usize,
        chunk_index: usize,
        seconds: f64,
    },

    /// The same chunk was recorded twice
    #[error("Duration already recorded for part {part_index}, chunk {chunk_index}")]
    DuplicateChunk {
        part_index: usize,
        chunk_index: usize,
    },

    /// A chunk outside the declared part/chunk ranges was recorded
    #[error("Unexpected chunk: part {part_index}, chunk {chunk_index}")]
    UnexpectedChunk {
        part_index: usize,
        chunk_index: usize,
    },
}

fn not_found_message(part_index: &usize, chunk_index: &Option<usize>) -> String {
    match chunk_index {
        Some(chunk_index) => format!(
            "No timeline entry for part {}, chunk {}",
            part_index, chunk_index
        ),
        None => format!("No timeline entries for part {}", part_index),
    }
}

/// Errors that can occur when calling a speech synthesizer
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error writing the synthesized audio
    #[error("Audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a whole timeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error from chunking, aggregation or building
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Synthesis of one chunk failed hard
    #[error("Synthesis failed for part {part_index}, chunk {chunk_index}: {source}")]
    Synthesis {
        part_index: usize,
        chunk_index: usize,
        #[source]
        source: SynthesisError,
    },

    /// Synthesis of one chunk did not finish in time
    #[error("Synthesis timed out after {timeout_ms}ms for part {part_index}, chunk {chunk_index}")]
    Timeout {
        part_index: usize,
        chunk_index: usize,
        timeout_ms: u64,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a timeline run
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from timeline logic outside of a run
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
