//! HTTP telemetry sink
//!
//! Rows are posted as flat JSON objects to a collector endpoint. `open()`
//! checks that the endpoint is reachable; rows are refused until it has
//! succeeded.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use shared::{stage_debug, stage_info, Stage};

use crate::core::record::TelemetryRecord;
use crate::error::{HarnessError, HarnessResult};
use crate::traits::TelemetrySink;

const COMPONENT: &str = "telemetry sink";

/// Real telemetry sink backed by an HTTP collector
pub struct HttpTelemetrySink {
    endpoint: String,
    token: Option<String>,
    client: Option<Client>,
}

impl HttpTelemetrySink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            client: None,
        }
    }

    /// Attach a bearer token to every request (fluent API)
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn open(&mut self) -> HarnessResult<()> {
        let client = Client::builder().build()?;
        let response = self.authorize(client.get(&self.endpoint)).send().await?;

        if !response.status().is_success() {
            return Err(HarnessError::infrastructure(
                COMPONENT,
                format!("opening {} returned HTTP {}", self.endpoint, response.status()),
            ));
        }

        stage_info!(Stage::Telemetry, endpoint = %self.endpoint, "Telemetry sink opened");
        self.client = Some(client);
        Ok(())
    }

    async fn append_row(&self, record: &TelemetryRecord) -> HarnessResult<()> {
        let client = self.client.as_ref().ok_or(HarnessError::SinkNotOpen)?;
        let response = self.authorize(client.post(&self.endpoint)).json(record).send().await?;

        if !response.status().is_success() {
            return Err(HarnessError::infrastructure(
                COMPONENT,
                format!("append returned HTTP {}", response.status()),
            ));
        }

        stage_debug!(Stage::Telemetry, columns = record.len(), "Telemetry row appended");
        Ok(())
    }
}
