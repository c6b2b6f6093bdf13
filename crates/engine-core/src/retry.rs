use crate::flag::ErrorFlag;
use std::{fmt, sync::Arc, time::Duration};

/// Delay to wait before a given attempt. Attempt indices start at 0.
pub trait BackoffPolicy: fmt::Debug + Send + Sync {
    fn delay(&self, attempt: usize) -> Duration;
}

/// `min(step * attempt, cap)`: nothing before the first attempt, then a
/// linearly growing pause that levels off at `cap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CappedLinearBackoff {
    pub step: Duration,
    pub cap: Duration,
}

impl Default for CappedLinearBackoff {
    fn default() -> Self {
        Self {
            step: Duration::from_secs(1),
            cap: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy for CappedLinearBackoff {
    fn delay(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
        self.step.saturating_mul(factor).min(self.cap)
    }
}

/// `base * 2^(attempt - 1)` capped at `max`, with no delay before the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 || self.base.is_zero() {
            return Duration::ZERO;
        }

        let exponent = (attempt - 1).min(16) as u32;
        self.base.saturating_mul(1u32 << exponent).min(self.max)
    }
}

/// Why [`RetryPolicy::run`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the last error.
    Exhausted { attempts: usize, last: E },
    /// The error flag went up between attempts.
    Cancelled { attempts: usize, last: Option<E> },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> usize {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Bounded retry loop for blocking operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: Arc<dyn BackoffPolicy>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(20, CappedLinearBackoff::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: impl BackoffPolicy + 'static) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn delay(&self, attempt: usize) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Runs `op` until it succeeds or `max_attempts` attempts have failed.
    ///
    /// Each attempt is preceded by the backoff delay for its index. The first
    /// attempt is always made; later ones are skipped once `flag` is raised,
    /// and a raise during a backoff pause ends the pause early.
    pub fn run<T, E, F>(&self, flag: &ErrorFlag, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        let mut last = None;

        for attempt in 0..self.max_attempts {
            let retrying = attempt > 0;
            if retrying && flag.is_raised() {
                return Err(RetryError::Cancelled {
                    attempts: attempt,
                    last,
                });
            }

            let delay = self.backoff.delay(attempt);
            if !delay.is_zero() && !flag.sleep(delay) && retrying {
                return Err(RetryError::Cancelled {
                    attempts: attempt,
                    last,
                });
            }

            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => last = Some(err),
            }
        }

        match last {
            Some(last) => Err(RetryError::Exhausted {
                attempts: self.max_attempts,
                last,
            }),
            None => Err(RetryError::Cancelled {
                attempts: self.max_attempts,
                last: None,
            }),
        }
    }
}
