//! Solver trait, progress reporting and cooperative cancellation.

use crate::problem::Problem;
use crate::result::OptimizationResult;
use crate::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Progress callback for long-running operations. Must not block.
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Progress information emitted at strategy boundaries and per generation
/// or iteration inside the metaheuristics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressInfo {
    /// Name of the strategy currently running.
    pub algorithm: String,
    /// Overall progress, 0-100.
    pub progress_percent: f64,
    /// Stage description.
    pub stage: String,
}

impl ProgressInfo {
    /// Creates a progress event at 0%.
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            progress_percent: 0.0,
            stage: String::new(),
        }
    }

    /// Sets the progress, clamped to 0-100.
    pub fn with_progress(mut self, percent: f64) -> Self {
        self.progress_percent = percent.clamp(0.0, 100.0);
        self
    }

    /// Sets the stage description.
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }
}

/// Creates a bounded channel wrapped as a [`ProgressCallback`].
///
/// Sending never blocks: when the buffer is full or the receiver is gone
/// the event is dropped.
pub fn progress_channel(capacity: usize) -> (ProgressCallback, Receiver<ProgressInfo>) {
    let (tx, rx) = sync_channel(capacity.max(1));
    let callback: ProgressCallback = Arc::new(move |info| {
        let _ = tx.try_send(info);
    });
    (callback, rx)
}

/// Shared cancellation flag with an optional deadline.
///
/// Strategies poll [`is_cancelled`](Self::is_cancelled) once per
/// generation, iteration or stock instance.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Creates a token that never fires on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Requests cancellation of every holder of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Builds the engine RNG from an optional seed.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// A cutting-stock strategy.
pub trait Solver: Send + Sync {
    /// Strategy name used in reports.
    fn name(&self) -> &'static str;

    /// Solves the problem.
    fn solve(&self, problem: &Problem) -> Result<OptimizationResult>;

    /// Solves with a progress callback.
    fn solve_with_progress(
        &self,
        problem: &Problem,
        callback: ProgressCallback,
    ) -> Result<OptimizationResult> {
        callback(ProgressInfo::new(self.name()).with_stage("started"));
        let result = self.solve(problem)?;
        callback(
            ProgressInfo::new(self.name())
                .with_progress(100.0)
                .with_stage("finished"),
        );
        Ok(result)
    }

    /// Cancels an ongoing solve operation.
    fn cancel(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_progress_builder_clamps() {
        let info = ProgressInfo::new("genetic")
            .with_progress(150.0)
            .with_stage("generation 10");
        assert_eq!(info.progress_percent, 100.0);
        assert_eq!(info.stage, "generation 10");
    }

    #[test]
    fn test_progress_channel_never_blocks() {
        let (callback, rx) = progress_channel(2);
        for i in 0..10 {
            callback(ProgressInfo::new("greedy").with_progress(i as f64));
        }
        let received: Vec<ProgressInfo> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].progress_percent, 0.0);

        drop(rx);
        callback(ProgressInfo::new("greedy"));
    }

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_deadline_token() {
        let token = CancellationToken::new().with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
        let token = CancellationToken::new().with_timeout(Duration::from_secs(3600));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = rng_from_seed(Some(7));
        let mut b = rng_from_seed(Some(7));
        for _ in 0..5 {
            assert_eq!(a.gen::<u32>(), b.gen::<u32>());
        }
    }
}
