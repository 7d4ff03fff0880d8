use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Snapshot returned by the progress endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current: u32,
    pub total: u32,
}

/// Process-wide segment progress for the most recently started request.
///
/// There is deliberately no request identity: overlapping requests
/// overwrite each other and the last writer wins. Counters only ever move
/// forward within one request's lifetime.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    current: AtomicU32,
    total: AtomicU32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking a new request with `total` expected segments.
    pub fn reset(&self, total: u32) {
        self.current.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Record that segments up to and including `completed` are done.
    pub fn set_completed(&self, completed: u32) {
        self.current.store(completed, Ordering::Relaxed);
    }

    /// Mark the request finished: `current` snaps to `total`.
    pub fn finish(&self) {
        let total = self.total.load(Ordering::Relaxed);
        self.current.store(total, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            current: self.current.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_current() {
        let tracker = ProgressTracker::new();
        tracker.reset(5);
        tracker.set_completed(3);
        tracker.reset(8);

        let snap = tracker.snapshot();
        assert_eq!(snap.current, 0);
        assert_eq!(snap.total, 8);
    }

    #[test]
    fn test_finish_snaps_to_total() {
        let tracker = ProgressTracker::new();
        tracker.reset(4);
        tracker.set_completed(2);
        tracker.finish();

        let snap = tracker.snapshot();
        assert_eq!(snap.current, 4);
        assert_eq!(snap.total, 4);
    }

    #[test]
    fn test_snapshot_reflects_completed_segments() {
        let tracker = ProgressTracker::new();
        tracker.reset(10);
        for i in 1..=7 {
            tracker.set_completed(i);
        }

        assert_eq!(
            tracker.snapshot(),
            ProgressSnapshot {
                current: 7,
                total: 10
            }
        );
    }
}
