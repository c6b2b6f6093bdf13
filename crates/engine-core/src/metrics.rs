use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_read: AtomicU64,
    rows_uploaded: AtomicU64,
    batches_enqueued: AtomicU64,
    batches_delivered: AtomicU64,
    bytes_delivered: AtomicU64,
    failed_attempts: AtomicU64,
}

/// Counters shared by the producer and the upload workers of one run.
#[derive(Debug, Clone, Default)]
pub struct TransferMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rows_read: u64,
    pub rows_uploaded: u64,
    pub batches_enqueued: u64,
    pub batches_delivered: u64,
    pub bytes_delivered: u64,
    pub failed_attempts: u64,
}

impl TransferMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_rows_read(&self, count: u64) {
        self.inner.rows_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches_enqueued(&self, count: u64) {
        self.inner
            .batches_enqueued
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Records one successfully delivered batch.
    pub fn record_delivery(&self, rows: u64, bytes: u64) {
        self.inner.rows_uploaded.fetch_add(rows, Ordering::SeqCst);
        self.inner.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.inner.bytes_delivered.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_failed_attempts(&self, count: u64) {
        self.inner.failed_attempts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn rows_uploaded(&self) -> u64 {
        self.inner.rows_uploaded.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_read: self.inner.rows_read.load(Ordering::Relaxed),
            rows_uploaded: self.inner.rows_uploaded.load(Ordering::SeqCst),
            batches_enqueued: self.inner.batches_enqueued.load(Ordering::Relaxed),
            batches_delivered: self.inner.batches_delivered.load(Ordering::Relaxed),
            bytes_delivered: self.inner.bytes_delivered.load(Ordering::Relaxed),
            failed_attempts: self.inner.failed_attempts.load(Ordering::Relaxed),
        }
    }
}
