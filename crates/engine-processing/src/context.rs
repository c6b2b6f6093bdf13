use engine_core::{
    flag::ErrorFlag, metrics::TransferMetrics, progress::RateLimitedReporter, queue::HandoffQueue,
};
use model::records::Batch;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// State shared by the extraction driver, the upload workers and the
/// orchestrator for the lifetime of one run.
#[derive(Clone)]
pub struct PipelineContext {
    pub queue: Arc<HandoffQueue<Batch>>,
    pub flag: Arc<ErrorFlag>,
    pub metrics: TransferMetrics,
    pub reporter: Arc<RateLimitedReporter>,
    producer_done: Arc<AtomicBool>,
}

impl PipelineContext {
    pub fn new(
        queue_capacity: usize,
        metrics: TransferMetrics,
        reporter: RateLimitedReporter,
    ) -> Self {
        Self {
            queue: Arc::new(HandoffQueue::new(queue_capacity)),
            flag: Arc::new(ErrorFlag::new()),
            metrics,
            reporter: Arc::new(reporter),
            producer_done: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raises the error flag and releases everything blocked on the queue.
    pub fn abort(&self) -> bool {
        let first = self.flag.raise();
        self.queue.wakeup();
        first
    }

    pub fn mark_producer_done(&self) {
        self.producer_done.store(true, Ordering::SeqCst);
    }

    pub fn is_producer_done(&self) -> bool {
        self.producer_done.load(Ordering::SeqCst)
    }

    /// Whether upload workers should stop taking batches.
    pub fn should_stop(&self) -> bool {
        self.flag.is_raised() || self.is_producer_done()
    }
}
