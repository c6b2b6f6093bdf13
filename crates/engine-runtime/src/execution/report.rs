use engine_core::metrics::MetricsSnapshot;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// `true` iff the error flag was never raised during the run.
    pub success: bool,
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
}

impl TransferReport {
    pub fn rows_uploaded(&self) -> u64 {
        self.metrics.rows_uploaded
    }
}
