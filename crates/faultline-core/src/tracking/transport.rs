//! Delivery backends for tracking payloads

use super::payload::TrackingPayload;
use crate::error::{FaultlineError, FaultlineResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Sends one payload to an error tracking backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TrackingTransport: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    async fn send(&self, payload: &TrackingPayload) -> FaultlineResult<()>;
}

/// POSTs payloads as JSON
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FaultlineResult<Self> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(FaultlineError::config_field(
                "tracking.endpoint",
                format!("Tracking endpoint must be an http(s) URL, got '{}'", endpoint),
            ));
        }

        let http_client = Client::builder().timeout(timeout).build().map_err(|e| {
            FaultlineError::http(format!("Failed to build tracking HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl TrackingTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, payload: &TrackingPayload) -> FaultlineResult<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FaultlineError::http_with_status(
                format!("Tracking endpoint rejected event ({}): {}", status, body),
                self.endpoint.clone(),
                status.as_u16(),
            ));
        }
        Ok(())
    }
}

/// Writes payloads to the log instead of a remote backend
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl TrackingTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, payload: &TrackingPayload) -> FaultlineResult<()> {
        let extra = serde_json::to_string(&payload.extra)?;
        tracing::info!(
            target: "faultline::tracking",
            event_id = %payload.event_id,
            level = %payload.level,
            extra = %extra,
            "{}",
            payload.message
        );
        Ok(())
    }
}
