pub mod sink;

pub use sink::{HttpSink, HttpSinkConfig};
