pub mod batch;
pub mod record;

pub use batch::Batch;
pub use record::{Record, RecordError};
