//! Stop conditions for catalog synchronization
//!
//! A `CancellationToken` carries both an explicit cancel flag, which may be
//! raised from another thread, and an optional deadline. The sync loop asks
//! the token once per catalog item whether it should stop, so nothing is
//! written after either condition fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a sync run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    /// The deadline passed; carries the budget that was granted
    TimedOut(Duration),
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    budget: Duration,
}

/// Cancel flag plus optional deadline.
///
/// Clones share the flag, so cancelling any clone stops every holder. The
/// deadline is per value: [`with_timeout`](Self::with_timeout) on a clone
/// does not affect the original.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Deadline>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a deadline `budget` from now.
    ///
    /// An existing, earlier deadline is kept.
    pub fn with_timeout(mut self, budget: Duration) -> Self {
        let at = Instant::now() + budget;
        match self.deadline {
            Some(existing) if existing.at <= at => {}
            _ => self.deadline = Some(Deadline { at, budget }),
        }
        self
    }

    /// Add a deadline when `budget` is set
    pub fn with_optional_timeout(self, budget: Option<Duration>) -> Self {
        match budget {
            Some(budget) => self.with_timeout(budget),
            None => self,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// True once the deadline has been reached. A zero budget is expired
    /// immediately.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d.at)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// The reason to stop now, if any. Cancellation wins over expiry.
    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d.at => Some(StopReason::TimedOut(d.budget)),
            _ => None,
        }
    }
}
