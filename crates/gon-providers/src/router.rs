//! Provider router — picks a model for the caller's use case, calls it, turns
//! runtime failures into the fallback reply, and records usage exactly once
//! per call.
//!
//! Only contract errors (unknown model, empty request) reach the caller as
//! `Err`. Everything else, including an open circuit, a timeout and a
//! cancellation, becomes the canned apology with `fallback_used = true`. In
//! streaming mode the apology is also emitted as a chunk.

use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use gon_core::config::LlmConfig;
use gon_core::types::{InvocationResult, LlmReply, Message, ReplySource};
use gon_core::{Config, ConfigError};

use crate::catalog::UseCase;
use crate::circuit::CircuitSnapshot;
use crate::error::ProviderError;
use crate::normalizer::fallback_result;
use crate::openrouter::{GenerationParams, OpenRouterClient};
use crate::stats::{UsageSnapshot, UsageStats};
use crate::traits::{ChatRouter, RouteOptions};

// ─────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EngineHealth {
    pub available: bool,
    pub models: Vec<String>,
}

/// `{local, cloud, config, circuit}` at one point in time.
#[derive(Clone, Debug, Serialize)]
pub struct HealthSnapshot {
    /// Always unavailable: there is no local engine.
    pub local: EngineHealth,
    pub cloud: EngineHealth,
    pub config: LlmConfig,
    pub circuit: CircuitSnapshot,
}

// ─────────────────────────────────────────────
// ProviderRouter
// ─────────────────────────────────────────────

#[derive(Debug)]
pub struct ProviderRouter {
    client: OpenRouterClient,
    llm: LlmConfig,
    /// Configured params with the voice clamp applied.
    params: GenerationParams,
    stats: UsageStats,
}

impl ProviderRouter {
    pub fn new(client: OpenRouterClient, llm: LlmConfig) -> Self {
        let configured = client.default_params();
        let params = GenerationParams {
            max_tokens: llm.clamp_max_tokens(configured.max_tokens),
            temperature: configured.temperature,
        };
        Self {
            client,
            llm,
            params,
            stats: UsageStats::new(),
        }
    }

    /// Build the client and router from configuration. Fatal on any
    /// configuration error.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let client = OpenRouterClient::new(config)?;
        Ok(Self::new(client, config.llm.clone()))
    }

    pub fn client(&self) -> &OpenRouterClient {
        &self.client
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn llm_config(&self) -> &LlmConfig {
        &self.llm
    }

    /// Speed for voice, quality otherwise.
    pub fn default_use_case(&self) -> UseCase {
        if self.llm.voice_optimized {
            UseCase::Speed
        } else {
            UseCase::Quality
        }
    }

    pub fn usage_snapshot(&self) -> UsageSnapshot {
        self.stats.snapshot()
    }

    pub async fn health_check(&self) -> HealthSnapshot {
        let available = self.client.check_availability().await;
        let models = if available {
            self.client
                .available_models()
                .iter()
                .map(|m| m.key.to_string())
                .collect()
        } else {
            Vec::new()
        };

        HealthSnapshot {
            local: EngineHealth::default(),
            cloud: EngineHealth { available, models },
            config: self.llm.clone(),
            circuit: self.client.breaker().snapshot(),
        }
    }

    fn select_model(&self, options: &RouteOptions) -> String {
        self.client
            .selector()
            .best_for(options.use_case, options.language_hint.as_deref())
            .to_string()
    }

    /// Convert an outcome into a reply and record it.
    fn finish(
        &self,
        started: Instant,
        model_key: &str,
        outcome: Result<InvocationResult, ProviderError>,
    ) -> Result<LlmReply, ProviderError> {
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) if result.is_fallback() => {
                self.stats.record_fallback(latency_ms);
                Ok(fallback_reply(result, latency_ms))
            }
            Ok(result) => {
                let cost = result
                    .usage
                    .as_ref()
                    .and_then(|u| u.estimated_cost)
                    .unwrap_or(0.0);
                self.stats.record_success(latency_ms, cost);
                info!(model = %result.model, latency_ms, "Reply from OpenRouter");
                Ok(LlmReply {
                    content: result.content,
                    source: ReplySource::Cloud,
                    model: result.model,
                    latency_ms,
                    fallback_used: false,
                    usage: result.usage,
                })
            }
            Err(e) if e.is_contract_error() => {
                self.stats.record_rejected(latency_ms);
                Err(e)
            }
            Err(e) => {
                warn!(model = model_key, latency_ms, error = %e, "Provider failed, using fallback reply");
                self.stats.record_fallback(latency_ms);
                Ok(fallback_reply(fallback_result(), latency_ms))
            }
        }
    }
}

fn fallback_reply(result: InvocationResult, latency_ms: u64) -> LlmReply {
    LlmReply {
        content: result.content,
        source: ReplySource::Fallback,
        model: result.model,
        latency_ms,
        fallback_used: true,
        usage: result.usage,
    }
}

#[async_trait]
impl ChatRouter for ProviderRouter {
    async fn route(
        &self,
        messages: &[Message],
        options: &RouteOptions,
    ) -> Result<LlmReply, ProviderError> {
        let started = Instant::now();
        let model_key = self.select_model(options);
        let outcome = self
            .client
            .generate(messages, &model_key, &self.params, options.cancel.as_ref())
            .await;
        self.finish(started, &model_key, outcome)
    }

    async fn route_stream(
        &self,
        messages: &[Message],
        options: &RouteOptions,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<LlmReply, ProviderError> {
        let started = Instant::now();
        let model_key = self.select_model(options);
        let outcome = self
            .client
            .generate_stream(
                messages,
                &model_key,
                &self.params,
                options.cancel.as_ref(),
                &mut *on_chunk,
            )
            .await;
        let reply = self.finish(started, &model_key, outcome)?;

        // The apology follows any partial text as its own chunk.
        if reply.fallback_used {
            on_chunk(&reply.content);
        }
        Ok(reply)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
