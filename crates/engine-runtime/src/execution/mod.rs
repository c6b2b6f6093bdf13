pub mod abort;
pub mod executor;
pub mod report;

pub use abort::AbortHandle;
pub use executor::{PipelineStage, TransferExecutor, run};
pub use report::TransferReport;
