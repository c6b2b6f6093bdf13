use crate::{consumer::worker::UploadWorker, context::PipelineContext, error::ConsumerError};
use connectors::sink::SinkFactory;
use engine_core::retry::RetryPolicy;
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};
use tracing::{debug, error, info};

/// Fixed set of upload threads sharing one hand-off queue.
pub struct UploadWorkerPool {
    handles: Vec<(usize, JoinHandle<Result<u64, ConsumerError>>)>,
}

impl UploadWorkerPool {
    /// Spawns `workers` threads named `upload-worker-<n>`.
    ///
    /// If a thread cannot be spawned, the run is aborted and the workers
    /// already started are joined before the error is returned.
    pub fn start(
        ctx: &PipelineContext,
        sinks: Arc<dyn SinkFactory>,
        retry: RetryPolicy,
        workers: usize,
    ) -> Result<Self, ConsumerError> {
        let mut pool = Self {
            handles: Vec::with_capacity(workers),
        };

        for id in 1..=workers {
            let worker = UploadWorker::new(id, ctx.clone(), sinks.clone(), retry.clone());
            let spawned = thread::Builder::new()
                .name(format!("upload-worker-{id}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => pool.handles.push((id, handle)),
                Err(err) => {
                    error!(worker = id, error = %err, "Failed to spawn upload worker");
                    ctx.abort();
                    let _ = pool.join();
                    return Err(ConsumerError::Spawn(err));
                }
            }
        }

        info!(workers, target = sinks.endpoint(), "Upload workers started");
        Ok(pool)
    }

    /// Joins every worker. Returns the first worker error, if any.
    ///
    /// A worker that panicked counts as failed; it raised the error flag
    /// while unwinding.
    pub fn join(self) -> Result<u64, ConsumerError> {
        let mut delivered = 0;
        let mut first_error = None;

        for (id, handle) in self.handles {
            let outcome = match handle.join() {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(worker = id, "Upload worker panicked");
                    Err(ConsumerError::WorkerPanicked { worker: id })
                }
            };

            match outcome {
                Ok(batches) => delivered += batches,
                Err(err) => {
                    debug!(worker = id, error = %err, "Upload worker failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(delivered),
        }
    }
}
