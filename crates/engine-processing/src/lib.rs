pub mod consumer;
pub mod context;
pub mod error;
pub mod producer;
