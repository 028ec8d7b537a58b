//! Resilient HTTP invoker — one outbound JSON call guarded by a per-call
//! timeout, an optional cancellation token, and the circuit breaker.
//!
//! The breaker is consulted before any network activity; an open circuit
//! fails with [`InvokeError::CircuitOpen`] without touching the socket.
//! Outcomes are recorded once per call after the awaited request resolves. A
//! call dropped before that point records nothing.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gon_core::config::CircuitConfig;
use gon_core::utils::truncate_string;
use gon_core::ConfigError;

use crate::circuit::{CircuitBreaker, CircuitPermit};
use crate::error::InvokeError;

/// Identification headers sent with every request.
const REFERER: &str = "https://github.com/arthurcosta/real-time-stt-with-tts";
const TITLE: &str = "Personal Voice Assistant";

/// Characters of a non-JSON body kept in the error.
const PREVIEW_LEN: usize = 100;

pub struct ResilientInvoker {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL without trailing slash.
    base_url: String,
    api_key: String,
    /// Identification + user-configured headers.
    headers: HeaderMap,
    timeout: Duration,
    breaker: CircuitBreaker,
}

impl std::fmt::Debug for ResilientInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientInvoker")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("breaker", &self.breaker)
            .finish()
    }
}

impl ResilientInvoker {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout_ms: u64,
        extra_headers: Option<&HashMap<String, String>>,
        circuit: CircuitConfig,
    ) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert("http-referer", HeaderValue::from_static(REFERER));
        headers.insert("x-title", HeaderValue::from_static(TITLE));

        for (key, value) in extra_headers.into_iter().flatten() {
            if let (Ok(name), Ok(val)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, val);
            } else {
                warn!("Invalid header: {}={}", key, value);
            }
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            headers,
            timeout: Duration::from_millis(timeout_ms),
            breaker: CircuitBreaker::new("openrouter", circuit),
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// POST `payload` as JSON to `{base}/{endpoint}` and return the parsed body.
    pub async fn invoke<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
        cancel: Option<&CancellationToken>,
    ) -> Result<serde_json::Value, InvokeError> {
        let permit = self.breaker.try_acquire()?;

        debug!(endpoint, timeout_ms = self.timeout_ms(), "Invoking provider");
        let outcome = self.guarded(self.send_json(endpoint, payload), cancel).await;
        settle(permit, &outcome);

        if let Err(ref e) = outcome {
            warn!(endpoint, error = %e, "Provider call failed");
        }
        outcome
    }

    /// POST `payload` and hand back the open response for streaming. Only the
    /// connect + status check is guarded; the caller drains the body.
    pub async fn open_stream<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
        cancel: Option<&CancellationToken>,
    ) -> Result<reqwest::Response, InvokeError> {
        let permit = self.breaker.try_acquire()?;

        debug!(endpoint, "Opening provider stream");
        let outcome = self.guarded(self.connect(endpoint, payload), cancel).await;
        settle(permit, &outcome);

        if let Err(ref e) = outcome {
            warn!(endpoint, error = %e, "Provider stream failed to open");
        }
        outcome
    }

    /// Availability check that bypasses the breaker: `GET {base}/{endpoint}`,
    /// `true` iff the response is 2xx within `timeout`.
    pub async fn probe(&self, endpoint: &str, timeout: Duration) -> bool {
        let result = self
            .client
            .get(self.url(endpoint))
            .bearer_auth(&self.api_key)
            .headers(self.headers.clone())
            .timeout(timeout)
            .send()
            .await;

        match result {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(endpoint, error = %e, "Availability probe failed");
                false
            }
        }
    }

    /// Race `fut` against the per-call timeout and the caller's token.
    async fn guarded<T, F>(&self, fut: F, cancel: Option<&CancellationToken>) -> Result<T, InvokeError>
    where
        F: Future<Output = Result<T, InvokeError>>,
    {
        let timed = tokio::time::timeout(self.timeout, fut);
        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(InvokeError::Cancelled),
                    r = timed => r,
                }
            }
            None => timed.await,
        };

        match result {
            Ok(inner) => inner,
            Err(_) => Err(InvokeError::Timeout {
                timeout_ms: self.timeout_ms(),
            }),
        }
    }

    async fn connect<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<reqwest::Response, InvokeError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .bearer_auth(&self.api_key)
            .headers(self.headers.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| InvokeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(InvokeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<serde_json::Value, InvokeError> {
        let response = self.connect(endpoint, payload).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let body = response
            .text()
            .await
            .map_err(|e| InvokeError::Network(e.to_string()))?;

        if !is_json {
            return Err(InvokeError::NonJson {
                preview: truncate_string(&body, PREVIEW_LEN),
            });
        }

        serde_json::from_str(&body).map_err(|e| InvokeError::InvalidJson(e.to_string()))
    }
}

/// Record the outcome on the breaker. Cancellation records nothing and the
/// permit's drop frees the HalfOpen slot.
fn settle<T>(permit: CircuitPermit<'_>, outcome: &Result<T, InvokeError>) {
    match outcome {
        Ok(_) => permit.success(),
        Err(e) if e.counts_as_failure() => permit.failure(),
        Err(_) => drop(permit),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
