//! OpenRouter client — chat completions (plain and streaming) over the
//! resilient invoker, plus the `/models` availability probe.

use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gon_core::types::{ChatCompletionRequest, InvocationResult, Message};
use gon_core::{Config, ConfigError};

use crate::catalog::{self, ModelDescriptor, ModelSelector};
use crate::circuit::CircuitBreaker;
use crate::error::{InvokeError, ProviderError};
use crate::invoker::ResilientInvoker;
use crate::normalizer::{normalize, recover};
use crate::sse::{SseDecoder, SseEvent};

const COMPLETIONS_ENDPOINT: &str = "chat/completions";
const MODELS_ENDPOINT: &str = "models";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sampling parameters for one call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

pub struct OpenRouterClient {
    invoker: ResilientInvoker,
    selector: ModelSelector,
    params: GenerationParams,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("default_model", &self.selector.default_model())
            .field("invoker", &self.invoker)
            .finish()
    }
}

impl OpenRouterClient {
    /// Build a client from validated configuration.
    ///
    /// Fails fast on a disabled feature flag, a missing key, out-of-range
    /// settings, or a default model that is not in the catalog.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let openrouter = config.require_openrouter()?;

        let selector = ModelSelector::new(&openrouter.default_model, openrouter.prefer_free_models)
            .map_err(|_| ConfigError::UnknownDefaultModel(openrouter.default_model.clone()))?;

        if config.llm.prefer_local {
            warn!("preferLocal is set but no local engine is available; ignoring");
        }

        let invoker = ResilientInvoker::new(
            &openrouter.api_base,
            &openrouter.api_key,
            config.llm.cloud_timeout_ms,
            openrouter.extra_headers.as_ref(),
            config.circuit.clone(),
        )?;

        info!(
            api_base = %openrouter.api_base,
            default_model = %openrouter.default_model,
            timeout_ms = config.llm.cloud_timeout_ms,
            "OpenRouter client initialized"
        );

        Ok(Self {
            invoker,
            selector,
            params: GenerationParams {
                max_tokens: openrouter.max_tokens,
                temperature: openrouter.temperature,
            },
        })
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    /// Parameters from configuration (before any voice clamp).
    pub fn default_params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        self.invoker.breaker()
    }

    /// Models offered to users: free first, then paid.
    pub fn available_models(&self) -> Vec<&'static ModelDescriptor> {
        catalog::available_models()
    }

    /// `GET /models` within 5 s.
    pub async fn check_availability(&self) -> bool {
        self.invoker.probe(MODELS_ENDPOINT, PROBE_TIMEOUT).await
    }

    /// One non-streaming completion.
    ///
    /// Transient failures (rate limit, non-JSON body) come back as the
    /// fallback result; other invocation failures are `Err`.
    pub async fn generate(
        &self,
        messages: &[Message],
        model_key: &str,
        params: &GenerationParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<InvocationResult, ProviderError> {
        let descriptor = catalog::resolve(model_key)?;
        let request = build_request(messages, descriptor, params, false)?;

        debug!(
            model = descriptor.provider_model_id,
            messages = messages.len(),
            max_tokens = params.max_tokens,
            "Calling OpenRouter"
        );

        match self.invoker.invoke(COMPLETIONS_ENDPOINT, &request, cancel).await {
            Ok(raw) => normalize(raw, descriptor),
            Err(e) => recover(&e).ok_or(ProviderError::Invoke(e)),
        }
    }

    /// Streaming completion. Each content fragment goes to `on_chunk` as it is
    /// decoded; the returned result holds the concatenated text and no usage.
    /// An in-band `error` event fails the call after whatever was already
    /// emitted.
    pub async fn generate_stream(
        &self,
        messages: &[Message],
        model_key: &str,
        params: &GenerationParams,
        cancel: Option<&CancellationToken>,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<InvocationResult, ProviderError> {
        let descriptor = catalog::resolve(model_key)?;
        let request = build_request(messages, descriptor, params, true)?;

        debug!(model = descriptor.provider_model_id, "Streaming from OpenRouter");

        let response = match self
            .invoker
            .open_stream(COMPLETIONS_ENDPOINT, &request, cancel)
            .await
        {
            Ok(response) => response,
            Err(e) => return recover(&e).ok_or(ProviderError::Invoke(e)),
        };

        let idle_timeout = Duration::from_millis(self.invoker.timeout_ms());
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut content = String::new();

        let mut emit = |events: Vec<SseEvent>,
                        content: &mut String|
         -> Result<(), ProviderError> {
            for event in events {
                match event {
                    SseEvent::Delta(text) => {
                        on_chunk(&text);
                        content.push_str(&text);
                    }
                    SseEvent::Error(message) => {
                        warn!(
                            model = descriptor.key,
                            error = %message,
                            "Provider failed mid-stream"
                        );
                        return Err(ProviderError::MalformedResponse(format!(
                            "stream error: {message}"
                        )));
                    }
                    SseEvent::Done => {}
                }
            }
            Ok(())
        };

        while !decoder.is_done() {
            let next = tokio::time::timeout(idle_timeout, body.next());
            let next = match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(InvokeError::Cancelled.into()),
                        n = next => n,
                    }
                }
                None => next.await,
            };

            let chunk = match next {
                Ok(Some(chunk)) => chunk.map_err(|e| InvokeError::Network(e.to_string()))?,
                Ok(None) => break,
                Err(_) => {
                    return Err(InvokeError::Timeout {
                        timeout_ms: self.invoker.timeout_ms(),
                    }
                    .into())
                }
            };
            emit(decoder.feed(&chunk), &mut content)?;
        }
        emit(decoder.finish(), &mut content)?;

        if content.is_empty() {
            return Err(ProviderError::MalformedResponse(
                "stream ended without content".to_string(),
            ));
        }

        Ok(InvocationResult {
            content,
            model: descriptor.provider_model_id.to_string(),
            usage: None,
        })
    }
}

fn build_request(
    messages: &[Message],
    descriptor: &ModelDescriptor,
    params: &GenerationParams,
    stream: bool,
) -> Result<ChatCompletionRequest, ProviderError> {
    if messages.is_empty() {
        return Err(ProviderError::InvalidRequest(
            "at least one message is required".to_string(),
        ));
    }
    Ok(ChatCompletionRequest {
        model: descriptor.provider_model_id.to_string(),
        messages: messages.to_vec(),
        max_tokens: params.max_tokens,
        temperature: params.temperature,
        stream,
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
