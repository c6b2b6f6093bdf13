use connectors::error::{SinkError, SourceError};
use model::records::RecordError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Upload worker {worker} could not build its HTTP client: {source}")]
    Initialization {
        worker: usize,
        #[source]
        source: SinkError,
    },

    #[error("Retry attempts exhausted for batch {batch} after {attempts} attempts: {source}")]
    RetriesExhausted {
        batch: u64,
        attempts: usize,
        #[source]
        source: SinkError,
    },

    #[error("Failed to spawn upload worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Upload worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to build batch: {0}")]
    Record(#[from] RecordError),
}
