pub mod flag;
pub mod metrics;
pub mod progress;
pub mod queue;
pub mod retry;
