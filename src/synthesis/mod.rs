/*!
 * Speech synthesis collaborators.
 *
 * The timeline only needs one thing from a synthesizer: for each chunk, the
 * exact playback duration of the audio it produced, or an explicit "no
 * measurement". Implementations:
 * - `voicevox`: VOICEVOX engine over HTTP
 * - `DryRunSynthesizer`: produces nothing, every chunk falls back to the estimator
 * - `mock`: configurable behaviours for tests
 */

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::{SynthesisConfig, SynthesisProvider};
use crate::errors::SynthesisError;

pub mod mock;
pub mod voicevox;
pub mod wav;

pub use voicevox::Voicevox;

/// One chunk to synthesize
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub part_index: usize,
    pub chunk_index: usize,
    pub text: String,
    pub speaker_id: u32,
}

/// What a synthesizer produced for one chunk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SynthesisOutcome {
    /// Written audio artifact, if any
    pub audio_path: Option<PathBuf>,
    /// Exact playback duration; `None` means "no measurement", never zero
    pub measured_seconds: Option<f64>,
}

impl SynthesisOutcome {
    pub fn measured(audio_path: Option<PathBuf>, seconds: f64) -> Self {
        Self {
            audio_path,
            measured_seconds: Some(seconds),
        }
    }

    pub fn unmeasured(audio_path: Option<PathBuf>) -> Self {
        Self {
            audio_path,
            measured_seconds: None,
        }
    }
}

/// Common trait for all speech synthesizers
///
/// Calls for different chunks may run concurrently.
#[async_trait]
pub trait Synthesizer: Send + Sync + Debug {
    /// Synthesize one chunk.
    ///
    /// A soft failure where audio exists but its length is unknown is
    /// `Ok` with `measured_seconds: None`. Hard failures are errors and
    /// abort the run.
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError>;

    /// Check that the synthesizer is reachable before a run starts
    async fn test_connection(&self) -> Result<(), SynthesisError> {
        Ok(())
    }

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Synthesizer that produces no audio, so every chunk is estimated
#[derive(Debug, Clone, Default)]
pub struct DryRunSynthesizer;

#[async_trait]
impl Synthesizer for DryRunSynthesizer {
    async fn synthesize(&self, _request: SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        Ok(SynthesisOutcome::unmeasured(None))
    }

    fn name(&self) -> &str {
        "dry run"
    }
}

/// Build the configured synthesizer. Audio artifacts are written to `audio_dir`.
pub fn create_synthesizer(config: &SynthesisConfig, audio_dir: &Path) -> Result<Arc<dyn Synthesizer>> {
    match config.provider {
        SynthesisProvider::Voicevox => Ok(Arc::new(Voicevox::new(
            &config.endpoint,
            audio_dir,
            config.timeout_secs,
        )?)),
        SynthesisProvider::DryRun => Ok(Arc::new(DryRunSynthesizer)),
    }
}
