pub mod driver;

pub use driver::{ExtractionDriver, ExtractionSummary};
