use crate::{
    error::SinkError,
    sink::{BatchSink, SinkFactory},
};
use model::records::Batch;
use reqwest::{
    StatusCode,
    blocking::Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use std::time::Duration;
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    pub endpoint: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl SinkFactory for HttpSinkConfig {
    fn connect(&self) -> Result<Box<dyn BatchSink>, SinkError> {
        Ok(Box::new(HttpSink::new(self)?))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// POSTs batches as a JSON array to the insert endpoint.
///
/// Only `201 Created` counts as delivered.
pub struct HttpSink {
    client: Client,
    endpoint: String,
    authorization: Option<String>,
}

impl HttpSink {
    pub fn new(config: &HttpSinkConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::Init(e.to_string()))?;

        Ok(HttpSink {
            client,
            endpoint: config.endpoint.clone(),
            authorization: config
                .auth_token
                .as_ref()
                .map(|token| format!("Token {token}")),
        })
    }
}

impl BatchSink for HttpSink {
    fn deliver(&mut self, batch: &Batch) -> Result<(), SinkError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(batch.to_json_array());

        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send()?;
        let status = response.status();
        if status == StatusCode::CREATED {
            debug!(batch = batch.seq(), "Endpoint accepted batch");
            return Ok(());
        }

        let body = response
            .text()
            .unwrap_or_else(|_| "<unavailable>".to_string());

        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
