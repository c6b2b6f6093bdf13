use crate::{context::PipelineContext, error::ConsumerError};
use connectors::{
    error::SinkError,
    sink::{BatchSink, SinkFactory},
};
use engine_core::retry::{RetryError, RetryPolicy};
use model::records::Batch;
use std::{sync::Arc, thread};
use tracing::{debug, error, info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One upload thread: pops batches and delivers them until the run ends.
pub struct UploadWorker {
    id: usize,
    ctx: PipelineContext,
    sinks: Arc<dyn SinkFactory>,
    retry: RetryPolicy,
}

impl UploadWorker {
    pub fn new(
        id: usize,
        ctx: PipelineContext,
        sinks: Arc<dyn SinkFactory>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id,
            ctx,
            sinks,
            retry,
        }
    }

    /// Returns the number of batches this worker delivered.
    ///
    /// Any error returned here has already raised the error flag and woken
    /// the queue.
    pub fn run(self) -> Result<u64, ConsumerError> {
        let _unwind = AbortOnUnwind {
            id: self.id,
            ctx: &self.ctx,
        };

        let mut sink = match self.sinks.connect() {
            Ok(sink) => sink,
            Err(err) => {
                error!(
                    worker = self.id,
                    endpoint = self.sinks.endpoint(),
                    error = %err,
                    "Failed to initialize upload client"
                );
                self.ctx.abort();
                return Err(ConsumerError::Initialization {
                    worker: self.id,
                    source: err,
                });
            }
        };

        let mut delivered = 0;
        while !self.ctx.should_stop() {
            let Some(batch) = self.ctx.queue.interruptible_pop() else {
                continue;
            };

            match self.deliver(sink.as_mut(), &batch) {
                Ok(()) => delivered += 1,
                Err(RetryError::Exhausted { attempts, last }) => {
                    error!(
                        worker = self.id,
                        batch = batch.seq(),
                        attempts,
                        error = %last,
                        "Giving up on batch, retry attempts exhausted"
                    );
                    self.ctx.abort();
                    return Err(ConsumerError::RetriesExhausted {
                        batch: batch.seq(),
                        attempts,
                        source: last,
                    });
                }
                Err(RetryError::Cancelled { attempts, .. }) => {
                    info!(
                        worker = self.id,
                        batch = batch.seq(),
                        attempts,
                        "Upload abandoned, run is shutting down"
                    );
                    break;
                }
            }
        }

        debug!(worker = self.id, batches = delivered, "Upload worker exiting");
        Ok(delivered)
    }

    fn deliver(
        &self,
        sink: &mut dyn BatchSink,
        batch: &Batch,
    ) -> Result<(), RetryError<SinkError>> {
        let rows = batch.row_count();
        let bytes = batch.size_bytes();
        debug!(
            worker = self.id,
            batch = batch.seq(),
            target = self.sinks.endpoint(),
            rows,
            size_mb = %format!("{:.3}", bytes as f64 / BYTES_PER_MB),
            "Uploading batch"
        );

        self.retry.run(&self.ctx.flag, |attempt| {
            sink.deliver(batch).inspect_err(|err| {
                self.ctx.metrics.increment_failed_attempts(1);
                warn!(
                    worker = self.id,
                    batch = batch.seq(),
                    attempt = attempt + 1,
                    max_attempts = self.retry.max_attempts(),
                    status = ?err.status(),
                    error = %err,
                    "Upload attempt failed"
                );
            })
        })?;

        self.ctx.metrics.record_delivery(rows as u64, bytes as u64);
        self.ctx.reporter.run_maybe();
        Ok(())
    }
}

/// Aborts the run if the worker thread unwinds, so the producer is not left
/// blocked on a queue nobody pops anymore.
struct AbortOnUnwind<'a> {
    id: usize,
    ctx: &'a PipelineContext,
}

impl Drop for AbortOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(worker = self.id, "Upload worker panicked, aborting run");
            self.ctx.abort();
        }
    }
}
