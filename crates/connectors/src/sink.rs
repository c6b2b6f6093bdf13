use crate::error::SinkError;
use model::records::Batch;

/// Delivers one batch per call. A single attempt, no retries.
pub trait BatchSink: Send {
    fn deliver(&mut self, batch: &Batch) -> Result<(), SinkError>;
}

/// Builds one sink per upload worker.
pub trait SinkFactory: Send + Sync {
    fn connect(&self) -> Result<Box<dyn BatchSink>, SinkError>;

    /// Human readable delivery target, used in logs.
    fn endpoint(&self) -> &str;
}
