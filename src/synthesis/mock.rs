/*!
 * Mock synthesizer for testing.
 *
 * This module provides a synthesizer that simulates different behaviours:
 * - `MockSynthesizer::measured(s)` - Every chunk measures `s` seconds
 * - `MockSynthesizer::unmeasured()` - Audio without a measurable duration
 * - `MockSynthesizer::failing()` - Always fails with an error
 * - `MockSynthesizer::slow(ms)` - Sleeps before answering (for timeout testing)
 * - `MockSynthesizer::reversed(ms)` - Later chunks of a part finish first
 * - `MockSynthesizer::jittered(ms)` - Random completion order
 *
 * Per-chunk results can be pinned with `with_duration` and `with_failure`.
 */

use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::SynthesisError;
use crate::synthesis::{SynthesisOutcome, SynthesisRequest, Synthesizer};

/// Behaviour mode for the mock synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Every chunk measures the same duration
    Measured { seconds: f64 },
    /// Audio is produced but its duration cannot be measured
    Unmeasured,
    /// Always fails with an error
    Failing,
    /// Sleeps before answering with a measured duration
    Slow { delay_ms: u64 },
    /// Chunk `n` of a part sleeps `step_ms / (n + 1)`, so later chunks finish first
    Reversed { step_ms: u64 },
    /// Sleeps a random time up to `max_ms`
    Jittered { max_ms: u64 },
}

// Duration reported by the delaying behaviours
const DEFAULT_MEASURED_SECONDS: f64 = 1.0;

/// Mock synthesizer for testing timeline runs
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    behavior: MockBehavior,
    /// Pinned results: `Some` measures, `None` reports no measurement
    durations: HashMap<(usize, usize), Option<f64>>,
    failures: HashSet<(usize, usize)>,
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    completed: Arc<Mutex<Vec<(usize, usize)>>>,
    requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

impl MockSynthesizer {
    /// Create a new mock synthesizer with the specified behaviour
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            durations: HashMap::new(),
            failures: HashSet::new(),
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn measured(seconds: f64) -> Self {
        Self::new(MockBehavior::Measured { seconds })
    }

    pub fn unmeasured() -> Self {
        Self::new(MockBehavior::Unmeasured)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn reversed(step_ms: u64) -> Self {
        Self::new(MockBehavior::Reversed { step_ms })
    }

    pub fn jittered(max_ms: u64) -> Self {
        Self::new(MockBehavior::Jittered { max_ms })
    }

    /// Pin the result of one chunk; `None` reports no measurement
    pub fn with_duration(mut self, part_index: usize, chunk_index: usize, seconds: Option<f64>) -> Self {
        self.durations.insert((part_index, chunk_index), seconds);
        self
    }

    /// Pin measured durations for every chunk of a part
    pub fn with_part_durations(mut self, part_index: usize, seconds: &[f64]) -> Self {
        for (chunk_index, s) in seconds.iter().enumerate() {
            self.durations.insert((part_index, chunk_index), Some(*s));
        }
        self
    }

    /// Make one chunk fail
    pub fn with_failure(mut self, part_index: usize, chunk_index: usize) -> Self {
        self.failures.insert((part_index, chunk_index));
        self
    }

    /// Number of synthesize calls received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Chunks in the order their calls finished
    pub fn completion_order(&self) -> Vec<(usize, usize)> {
        self.completed.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Requests in the order they were received
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn delay_for(&self, request: &SynthesisRequest) -> Option<Duration> {
        let ms = match self.behavior {
            MockBehavior::Slow { delay_ms } => delay_ms,
            MockBehavior::Reversed { step_ms } => step_ms / (request.chunk_index as u64 + 1),
            MockBehavior::Jittered { max_ms } => rand::rng().random_range(0..=max_ms),
            _ => return None,
        };
        Some(Duration::from_millis(ms))
    }

    fn outcome_for(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let key = (request.part_index, request.chunk_index);
        if self.failures.contains(&key) || self.behavior == MockBehavior::Failing {
            return Err(SynthesisError::ApiError {
                status_code: 500,
                message: format!("mock failure for part {}, chunk {}", key.0, key.1),
            });
        }

        if let Some(pinned) = self.durations.get(&key) {
            return Ok(SynthesisOutcome {
                audio_path: None,
                measured_seconds: *pinned,
            });
        }

        Ok(match self.behavior {
            MockBehavior::Measured { seconds } => SynthesisOutcome::measured(None, seconds),
            MockBehavior::Unmeasured => SynthesisOutcome::unmeasured(None),
            _ => SynthesisOutcome::measured(None, DEFAULT_MEASURED_SECONDS),
        })
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay_for(&request) {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome_for(&request);
        if let Ok(mut completed) = self.completed.lock() {
            completed.push((request.part_index, request.chunk_index));
        }
        outcome
    }

    fn name(&self) -> &str {
        "mock"
    }
}
