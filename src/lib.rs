/*!
 * # voxline - drift-free subtitle timelines for synthesized narration
 *
 * A Rust library that places every subtitle chunk of a narration script on a
 * single global timeline built from the measured durations of its
 * synthesized audio.
 *
 * ## Features
 *
 * - Sentence-aware chunking of script parts into subtitle-sized pieces
 * - Bounded concurrent synthesis (VOICEVOX) with per-chunk timeouts
 * - Duration aggregation with a barrier: nothing is placed until every chunk reports
 * - Integer-millisecond timeline with contiguous, non-overlapping entries
 * - Fallback duration estimates, tagged and reported per chunk
 * - JSON timeline export, SRT subtitles and sync diagnostics
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `script`: Narration script loading
 * - `chunker`: Splitting parts into subtitle chunks
 * - `estimator`: Text-based duration estimates
 * - `aggregator`: Collecting per-chunk durations
 * - `timeline`: Building, querying and exporting the timeline:
 *   - `timeline::builder`: Cursor-based placement of entries
 *   - `timeline::query`: Lookups and diagnostics
 *   - `timeline::export`: JSON, SRT and sync report output
 * - `synthesis`: Speech synthesizers:
 *   - `synthesis::voicevox`: VOICEVOX engine client
 *   - `synthesis::wav`: WAV header parsing
 *   - `synthesis::mock`: Mock synthesizer for tests
 * - `pipeline`: One full timeline run
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod aggregator;
pub mod app_config;
pub mod app_controller;
pub mod chunker;
pub mod errors;
pub mod estimator;
pub mod file_utils;
pub mod pipeline;
pub mod script;
pub mod synthesis;
pub mod timeline;

// Re-export main types for easier usage
pub use aggregator::{ChunkDuration, DurationAggregator, DurationSource, FinalizedDurations};
pub use app_config::Config;
pub use chunker::{Chunk, ChunkedScript, Chunker};
pub use errors::{AppError, PipelineError, SynthesisError, TimelineError};
pub use estimator::DurationEstimator;
pub use pipeline::{PipelineOutput, TimelinePipeline};
pub use script::{ScriptDocument, ScriptPart};
pub use synthesis::{SynthesisOutcome, SynthesisRequest, Synthesizer};
pub use timeline::{PartSpan, SubtitleCue, SyncDiagnostics, Timeline, TimelineBuilder, TimelineEntry};
