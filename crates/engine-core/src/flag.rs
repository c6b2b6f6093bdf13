use std::{
    sync::{
        Condvar, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tracing::debug;

/// Run-wide failure signal shared by the producer, the upload workers and the
/// orchestrator.
///
/// Set-once: the first [`ErrorFlag::raise`] wins and the flag is never
/// cleared. Sleeping through [`ErrorFlag::sleep`] is cut short as soon as the
/// flag goes up, which keeps backoff delays from holding up shutdown.
#[derive(Debug, Default)]
pub struct ErrorFlag {
    raised: AtomicBool,
    lock: Mutex<()>,
    changed: Condvar,
}

impl ErrorFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Returns `true` only for the call that actually set it.
    pub fn raise(&self) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let first = !self.raised.swap(true, Ordering::SeqCst);
        self.changed.notify_all();

        if first {
            debug!("Error flag raised");
        }
        first
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` unless the flag is raised first.
    ///
    /// Returns `true` if the whole duration elapsed with the flag down.
    pub fn sleep(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.is_raised();
        }

        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .changed
            .wait_timeout_while(guard, duration, |_| !self.raised.load(Ordering::SeqCst))
            .unwrap_or_else(PoisonError::into_inner);

        !self.is_raised()
    }
}
