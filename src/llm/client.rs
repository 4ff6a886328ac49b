//! HTTP transport to the configured LLM endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::LlmConfig;
use super::dialect::Dialect;
use super::error::LlmError;
use super::message::{ModelReply, ModelRequest};

/// Base delay for retry backoff.
const RETRY_BASE_MS: u64 = 500;

/// Reachability of the LLM endpoint as seen by the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Connected,
    /// Endpoint answered with this non-200 status.
    Error(u16),
    Disconnected,
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Connected => write!(f, "connected"),
            ProbeStatus::Error(code) => write!(f, "error ({})", code),
            ProbeStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Something that can carry a request to a model and bring back its reply.
#[async_trait]
pub trait LlmTransport: Send + Sync {
    /// Dialect this transport speaks.
    fn dialect(&self) -> Dialect;

    /// Send one request and return the assistant's reply.
    async fn send(&self, request: &ModelRequest) -> Result<ModelReply, LlmError>;

    /// Check whether the endpoint is reachable. Never fails.
    async fn probe(&self) -> ProbeStatus;
}

/// LLM client backed by reqwest.
pub struct LlmClient {
    config: LlmConfig,
    dialect: Dialect,
    client: Client,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Setup(e.to_string()))?;
        let dialect = config.dialect();

        info!(
            endpoint = %config.endpoint,
            model = %config.model,
            dialect = %dialect,
            "LLM client configured"
        );

        Ok(Self {
            config,
            dialect,
            client,
        })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn post(&self, body: &Value, timeout: Duration) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(&self.config.endpoint)
            .timeout(timeout)
            .json(body);
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send_once(&self, body: &Value) -> Result<ModelReply, LlmError> {
        let timeout = self.config.timeout();
        let resp = self
            .post(body, timeout)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, timeout))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| LlmError::from_reqwest(e, timeout))?;
        self.dialect.decode(&text)
    }
}

#[async_trait]
impl LlmTransport for LlmClient {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn send(&self, request: &ModelRequest) -> Result<ModelReply, LlmError> {
        let body = self.dialect.encode(request, &self.config)?;

        let mut attempt = 0;
        loop {
            debug!(
                dialect = %self.dialect,
                messages = request.messages.len(),
                tools = request.tools.len(),
                attempt,
                "Sending request to LLM"
            );
            match self.send_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(attempt, RETRY_BASE_MS);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "LLM request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn probe(&self) -> ProbeStatus {
        let body = self.dialect.probe_body(&self.config.model);
        match self.post(&body, self.config.probe_timeout()).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => ProbeStatus::Connected,
            Ok(resp) => ProbeStatus::Error(resp.status().as_u16()),
            Err(e) => {
                debug!(error = %e, "LLM probe failed");
                ProbeStatus::Disconnected
            }
        }
    }
}

/// Calculate exponential backoff delay for a given attempt.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(30_000))
}
