//! Per-document wall-clock budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wall-clock budget for one document.
///
/// Each document owns its budget and its cancellation flag, so cancelling
/// one document never affects its siblings in a batch.
#[derive(Debug, Clone)]
pub struct TimeBudget {
    limit: Duration,
    approach_ratio: f32,
    started: Instant,
    cancelled: Arc<AtomicBool>,
}

impl TimeBudget {
    /// Start a budget now.
    pub fn start(limit: Duration, approach_ratio: f32) -> Self {
        Self {
            limit,
            approach_ratio: approach_ratio.clamp(0.0, 1.0),
            started: Instant::now(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self::start(Duration::MAX, 1.0)
    }

    /// The configured limit.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Time since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Handle that cancels this document's remaining optional work.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Whether the document was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Whether optional passes should stop.
    pub fn is_approaching(&self) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let threshold = self.limit.as_secs_f64() * f64::from(self.approach_ratio);
        self.elapsed().as_secs_f64() >= threshold
    }

    /// Whether the full limit has passed.
    pub fn is_exhausted(&self) -> bool {
        self.is_cancelled() || self.elapsed() >= self.limit
    }
}

/// Cancels the optional work of a single document.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}
