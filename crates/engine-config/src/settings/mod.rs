use crate::settings::error::SettingsError;
use connectors::{http::HttpSinkConfig, sql::query};
use engine_core::retry::{CappedLinearBackoff, RetryPolicy};
use std::time::Duration;

pub mod error;

pub const DEFAULT_BATCH_SIZE: usize = 128;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_MAX_RETRIES: usize = 20;
pub const DEFAULT_MYSQL_URL: &str = "mysql://localhost:3306/mydb?user=root";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRY_STEP: Duration = Duration::from_secs(1);
pub const DEFAULT_RETRY_CAP: Duration = Duration::from_secs(5);
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Single-slot relay: extraction can never run more than one batch ahead of
/// the upload workers.
pub const QUEUE_CAPACITY: usize = 1;

const INSERT_PATH: &str = "/api/v1/tables/insert";

/// Everything one transfer run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub source_table: String,
    pub destination_table: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Raw predicate appended after `WHERE`.
    pub filter: Option<String>,
    pub batch_size: usize,
    pub workers: usize,
    pub max_retries: usize,
    pub auth_token: Option<String>,
    pub mysql_url: String,
    pub request_timeout: Duration,
    pub retry_step: Duration,
    pub retry_cap: Duration,
    pub status_interval: Duration,
    pub queue_capacity: usize,
}

impl TransferSettings {
    /// Settings with every tunable at its default.
    pub fn new(
        source_table: impl Into<String>,
        destination_table: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            destination_table: destination_table.into(),
            host: host.into(),
            port,
            database: database.into(),
            filter: None,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            max_retries: DEFAULT_MAX_RETRIES,
            auth_token: None,
            mysql_url: DEFAULT_MYSQL_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_step: DEFAULT_RETRY_STEP,
            retry_cap: DEFAULT_RETRY_CAP,
            status_interval: DEFAULT_STATUS_INTERVAL,
            queue_capacity: QUEUE_CAPACITY,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        require("source_table", &self.source_table)?;
        require("destination_table", &self.destination_table)?;
        require("host", &self.host)?;
        require("database", &self.database)?;
        require("mysql", &self.mysql_url)?;

        positive("port", usize::from(self.port))?;
        positive("batch_size", self.batch_size)?;
        positive("upload_threads", self.workers)?;
        positive("max_retries", self.max_retries)?;
        positive("queue_capacity", self.queue_capacity)?;

        if self.request_timeout.is_zero() {
            return Err(SettingsError::Invalid {
                name: "request_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        if let Some(token) = &self.auth_token
            && token.trim().is_empty()
        {
            return Err(SettingsError::Invalid {
                name: "auth_token",
                reason: "must not be blank when given".to_string(),
            });
        }

        Ok(())
    }

    pub fn insert_url(&self) -> String {
        format!("http://{}:{}{INSERT_PATH}", self.host, self.port)
    }

    pub fn source_query(&self) -> String {
        query::select_all(&self.source_table, self.filter.as_deref())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            CappedLinearBackoff {
                step: self.retry_step,
                cap: self.retry_cap,
            },
        )
    }

    pub fn sink_config(&self) -> HttpSinkConfig {
        HttpSinkConfig {
            endpoint: self.insert_url(),
            auth_token: self.auth_token.clone(),
            timeout: self.request_timeout,
        }
    }
}

fn require(name: &'static str, value: &str) -> Result<(), SettingsError> {
    if value.trim().is_empty() {
        return Err(SettingsError::Missing(name));
    }
    Ok(())
}

fn positive(name: &'static str, value: usize) -> Result<(), SettingsError> {
    if value == 0 {
        return Err(SettingsError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
