pub mod error;
pub mod http;
pub mod sink;
pub mod source;
pub mod sql;
