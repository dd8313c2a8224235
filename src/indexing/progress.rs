//! Refresh phase and progress counters.
//!
//! Written by the coordination and worker threads, read lock-free by any
//! caller of the query API.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// Where the current refresh is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RefreshPhase {
    Idle = 0,
    Scanning = 1,
    Dispatching = 2,
    WorkersRunning = 3,
    Composing = 4,
}

impl RefreshPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Scanning,
            2 => Self::Dispatching,
            3 => Self::WorkersRunning,
            4 => Self::Composing,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Dispatching => "dispatching",
            Self::WorkersRunning => "loading",
            Self::Composing => "composing",
        };
        f.write_str(name)
    }
}

/// Atomic refresh state shared between the coordinator and readers.
#[derive(Debug, Default)]
pub struct RefreshProgress {
    phase: AtomicU8,
    total: AtomicUsize,
    done: AtomicUsize,
    loaded_once: AtomicBool,
}

impl RefreshProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RefreshPhase {
        RefreshPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: RefreshPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Reset counters for a new batch of `total` candidates.
    pub(crate) fn begin_batch(&self, total: usize) {
        self.done.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Record one finished candidate, loaded or failed.
    pub(crate) fn record_done(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn mark_loaded(&self) {
        self.loaded_once.store(true, Ordering::Release);
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase() != RefreshPhase::Idle
    }

    /// At least one refresh has settled and none is running.
    pub fn is_loaded(&self) -> bool {
        self.loaded_once.load(Ordering::Acquire) && !self.is_refreshing()
    }

    /// Candidates processed so far in the current batch.
    pub fn counts(&self) -> (usize, usize) {
        (
            self.done.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }

    /// Fraction of the current batch that has been processed, in `[0, 1]`.
    ///
    /// Idle reports 1.0 after the first completed refresh and 0.0 before it.
    pub fn fraction(&self) -> f32 {
        if !self.is_refreshing() {
            return if self.loaded_once.load(Ordering::Acquire) {
                1.0
            } else {
                0.0
            };
        }
        let (done, total) = self.counts();
        if total == 0 {
            0.0
        } else {
            (done as f32 / total as f32).min(1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_through_lifecycle() {
        let progress = RefreshProgress::new();
        assert_eq!(progress.fraction(), 0.0);
        assert!(!progress.is_loaded());

        progress.set_phase(RefreshPhase::WorkersRunning);
        progress.begin_batch(4);
        progress.record_done();
        assert_eq!(progress.fraction(), 0.25);
        assert!(progress.is_refreshing());

        progress.record_done();
        progress.record_done();
        progress.record_done();
        assert_eq!(progress.fraction(), 1.0);

        progress.mark_loaded();
        assert!(!progress.is_loaded());
        progress.set_phase(RefreshPhase::Idle);
        assert!(progress.is_loaded());
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(RefreshPhase::WorkersRunning.to_string(), "loading");
        assert_eq!(RefreshPhase::from_u8(42), RefreshPhase::Idle);
    }
}
