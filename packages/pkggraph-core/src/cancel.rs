//! Cooperative cancellation for long-running scans.
//!
//! Workers check the token once per package, the resolver before seeding
//! and once per wave. A token with neither a deadline nor a manual cancel
//! never trips, so the default scan only ever pays for an atomic load per
//! check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ScanError;

/// Shared cancellation signal: a manual flag plus an optional deadline.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    started: Instant,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Token that never cancels on its own.
    pub fn new() -> Self {
        Self::with_deadline(None)
    }

    /// Token that trips once `timeout` has elapsed from now. A timeout too
    /// large to represent as an `Instant` never trips.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Some(timeout))
    }

    fn with_deadline(timeout: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                started,
                deadline: timeout.and_then(|t| started.checked_add(t)),
            }),
        }
    }

    /// Request cancellation. Idempotent; visible to all clones.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        match self.inner.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Ok when the scan may continue, the corresponding fatal error once
    /// the token has tripped.
    pub fn check(&self) -> Result<(), ScanError> {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            return Err(ScanError::Cancelled);
        }
        if let Some(deadline) = self.inner.deadline {
            if Instant::now() >= deadline {
                return Err(ScanError::DeadlineExceeded {
                    elapsed_ms: self.inner.started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
