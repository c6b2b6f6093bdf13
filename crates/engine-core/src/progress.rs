use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

type ReportFn = Box<dyn Fn() + Send + Sync>;

/// Runs a status callback at most once per `period`, with a forced variant
/// for the final report.
///
/// Shared by the producer and every upload worker; the callback itself runs
/// outside the internal lock.
pub struct RateLimitedReporter {
    period: Duration,
    last_run: Mutex<Option<Instant>>,
    report: ReportFn,
}

impl RateLimitedReporter {
    pub fn new(period: Duration, report: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            period,
            last_run: Mutex::new(None),
            report: Box::new(report),
        }
    }

    /// Reports if at least `period` passed since the last report. Returns
    /// whether the callback ran.
    pub fn run_maybe(&self) -> bool {
        let now = Instant::now();
        {
            let mut last_run = self.last_run.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = *last_run
                && now.duration_since(previous) < self.period
            {
                return false;
            }
            *last_run = Some(now);
        }

        (self.report)();
        true
    }

    pub fn run_force(&self) {
        *self.last_run.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        (self.report)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn counting(period: Duration) -> (RateLimitedReporter, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let reporter = RateLimitedReporter::new(period, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (reporter, calls)
    }

    #[test]
    fn first_call_reports_then_throttles() {
        let (reporter, calls) = counting(Duration::from_secs(3600));
        assert!(reporter.run_maybe());
        assert!(!reporter.run_maybe());
        assert!(!reporter.run_maybe());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reports_again_after_period() {
        let (reporter, calls) = counting(Duration::from_millis(20));
        assert!(reporter.run_maybe());
        std::thread::sleep(Duration::from_millis(30));
        assert!(reporter.run_maybe());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn forced_report_always_runs() {
        let (reporter, calls) = counting(Duration::from_secs(3600));
        reporter.run_maybe();
        reporter.run_force();
        reporter.run_force();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!reporter.run_maybe());
    }

    #[test]
    fn concurrent_callers_respect_the_limit() {
        let (reporter, calls) = counting(Duration::from_secs(3600));
        let reporter = Arc::new(reporter);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reporter = reporter.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        reporter.run_maybe();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
