use thiserror::Error;

/// Errors raised by a row source while connecting, describing a table or
/// streaming a query's result set.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The connection string could not be understood.
    #[error("Invalid connection string '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection-level MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// The source does not know the requested table.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A query failed to execute or its result set broke off mid-stream.
    #[error("Query failed: {query}: {source}")]
    Query {
        query: String,
        #[source]
        source: mysql_async::Error,
    },

    #[error("Source error: {0}")]
    Other(String),
}

/// Errors raised by a sink while delivering one batch.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink client could not be constructed.
    #[error("Failed to initialize sink client: {0}")]
    Init(String),

    /// Network-level failure: connect, timeout, broken transfer.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with something other than 201 Created.
    #[error("Endpoint rejected batch with HTTP status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl SinkError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SinkError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
