/*!
 * One timeline run.
 *
 * Chunk the script, synthesize every chunk across a bounded number of
 * concurrent calls, collect the durations and build the timeline once all of
 * them are in. Any failed or timed-out chunk abandons the run: in-flight
 * calls are dropped and no timeline is produced.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::aggregator::{DurationAggregator, DurationSource};
use crate::app_config::Config;
use crate::chunker::{ChunkedScript, Chunker};
use crate::errors::{PipelineError, TimelineError};
use crate::estimator::DurationEstimator;
use crate::script::ScriptDocument;
use crate::synthesis::{SynthesisRequest, Synthesizer};
use crate::timeline::{Timeline, TimelineBuilder};

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Chunk texts, needed for subtitle export
    pub chunked: ChunkedScript,
    /// The finished timeline, safe to share between readers
    pub timeline: Arc<Timeline>,
    /// Audio written by the synthesizer, keyed by `(part_index, chunk_index)`
    pub audio_files: BTreeMap<(usize, usize), PathBuf>,
}

/// Drives chunking, synthesis, aggregation and building for one script
#[derive(Debug, Clone)]
pub struct TimelinePipeline {
    chunker: Chunker,
    estimator: DurationEstimator,
    synthesizer: Arc<dyn Synthesizer>,
    default_speaker: u32,
    concurrent_requests: usize,
    timeout: Duration,
}

impl TimelinePipeline {
    pub fn new(config: &Config, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            chunker: Chunker::from_config(&config.chunking),
            estimator: DurationEstimator::from_config(&config.estimator),
            synthesizer,
            default_speaker: config.synthesis.default_speaker,
            concurrent_requests: config.synthesis.concurrent_requests.max(1),
            timeout: Duration::from_secs(config.synthesis.timeout_secs.max(1)),
        }
    }

    /// Override the per-chunk synthesis timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the number of synthesis calls in flight
    pub fn with_concurrency(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }

    pub fn synthesizer(&self) -> &Arc<dyn Synthesizer> {
        &self.synthesizer
    }

    /// Chunk a script without synthesizing anything
    pub fn chunk(&self, script: &ScriptDocument) -> Result<ChunkedScript, PipelineError> {
        Ok(self.chunker.chunk_script(script)?)
    }

    /// Run the whole pipeline. `progress` is called with `(completed, total)`
    /// chunk counts as synthesis calls finish.
    pub async fn run<F>(&self, script: &ScriptDocument, progress: F) -> Result<PipelineOutput, PipelineError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let chunked = self.chunk(script)?;
        let total = chunked.total_chunks();
        if total == 0 {
            return Err(TimelineError::EmptyTimeline.into());
        }

        info!(
            "Synthesizing {} chunks from {} parts with {} ({} at a time)",
            total,
            chunked.parts().len(),
            self.synthesizer.name(),
            self.concurrent_requests
        );

        let speakers: HashMap<usize, u32> = script
            .parts
            .iter()
            .map(|part| (part.part_index, part.resolve_speaker(self.default_speaker)))
            .collect();

        let mut aggregator = DurationAggregator::from_chunked(&chunked);
        let mut audio_files = BTreeMap::new();
        let mut estimated = 0;

        let mut results = stream::iter(chunked.chunks())
            .map(|chunk| {
                let synthesizer = Arc::clone(&self.synthesizer);
                let timeout = self.timeout;
                let request = SynthesisRequest {
                    part_index: chunk.part_index,
                    chunk_index: chunk.chunk_index,
                    text: chunk.text.clone(),
                    speaker_id: speakers
                        .get(&chunk.part_index)
                        .copied()
                        .unwrap_or(self.default_speaker),
                };

                async move {
                    let result = tokio::time::timeout(timeout, synthesizer.synthesize(request)).await;
                    (chunk, result)
                }
            })
            .buffer_unordered(self.concurrent_requests);

        let mut completed = 0;
        while let Some((chunk, result)) = results.next().await {
            let outcome = match result {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(source)) => {
                    error!(
                        "Synthesis failed for part {}, chunk {}: {}. Abandoning run.",
                        chunk.part_index, chunk.chunk_index, source
                    );
                    return Err(PipelineError::Synthesis {
                        part_index: chunk.part_index,
                        chunk_index: chunk.chunk_index,
                        source,
                    });
                }
                Err(_) => {
                    error!(
                        "Synthesis timed out for part {}, chunk {}. Abandoning run.",
                        chunk.part_index, chunk.chunk_index
                    );
                    return Err(PipelineError::Timeout {
                        part_index: chunk.part_index,
                        chunk_index: chunk.chunk_index,
                        timeout_ms: self.timeout.as_millis() as u64,
                    });
                }
            };

            let source = aggregator.record_outcome(chunk, outcome.measured_seconds, &self.estimator)?;
            if source == DurationSource::Estimated {
                estimated += 1;
            }
            if let Some(path) = outcome.audio_path {
                audio_files.insert((chunk.part_index, chunk.chunk_index), path);
            }

            completed += 1;
            progress(completed, total);
        }
        drop(results);

        let finalized = aggregator.finalize()?;
        let timeline = TimelineBuilder::build(&finalized)?;

        if estimated > 0 {
            warn!("{} of {} chunk durations were estimated, subtitles may drift", estimated, total);
        }
        debug!(
            "Timeline built: {} entries, {:.3}s",
            timeline.len(),
            timeline.total_seconds()
        );

        Ok(PipelineOutput {
            chunked,
            timeline: Arc::new(timeline),
            audio_files,
        })
    }
}
