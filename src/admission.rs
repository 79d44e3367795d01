//! Admission control using a lock-free counter gate
//!
//! The AdmissionLimiter bounds how many batch operations may be in flight
//! across the whole process. It never blocks and never queues: a caller is
//! either admitted immediately or rejected with [`Error::LimitReached`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};

/// Process-wide gate on concurrently running batches
///
/// # Algorithm
///
/// Optimistic compare-and-swap loop:
/// - Read the current in-flight count
/// - If it has reached the maximum, fail immediately
/// - Otherwise try to swap in `current + 1`; if another acquirer changed the
///   value first, re-read and retry the whole check
///
/// Release is an unconditional atomic decrement, performed by dropping the
/// [`AdmissionGuard`] returned from [`try_acquire`](Self::try_acquire). Each
/// successful acquire therefore releases exactly once, on every exit path.
#[derive(Debug)]
pub struct AdmissionLimiter {
    /// Maximum concurrently admitted batches
    max_concurrent: usize,
    /// Currently admitted, not yet released batches
    in_flight: AtomicUsize,
}

impl AdmissionLimiter {
    /// Create a limiter admitting at most `max_concurrent` batches at once
    ///
    /// # Examples
    ///
    /// ```
    /// use batch_dl::admission::AdmissionLimiter;
    ///
    /// let limiter = AdmissionLimiter::new(100);
    /// let guard = limiter.try_acquire().unwrap();
    /// assert_eq!(limiter.in_flight(), 1);
    /// drop(guard);
    /// assert_eq!(limiter.in_flight(), 0);
    /// ```
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            max_concurrent,
            in_flight: AtomicUsize::new(0),
        })
    }

    /// Try to admit one batch
    ///
    /// Returns a guard that releases the admission when dropped, or
    /// [`Error::LimitReached`] if the limiter is full.
    pub fn try_acquire(self: &Arc<Self>) -> Result<AdmissionGuard> {
        loop {
            let current = self.in_flight.load(Ordering::SeqCst);
            if current >= self.max_concurrent {
                return Err(Error::LimitReached);
            }

            if self
                .in_flight
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok(AdmissionGuard {
                    limiter: Arc::clone(self),
                });
            }
            // Lost the race to another acquirer or a release; re-check
        }
    }

    /// Number of batches currently admitted
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Configured maximum
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    fn release(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "admission released more times than acquired");
    }
}

/// One admitted batch; dropping it releases the admission
#[derive(Debug)]
#[must_use = "dropping the guard releases the admission immediately"]
pub struct AdmissionGuard {
    limiter: Arc<AdmissionLimiter>,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
