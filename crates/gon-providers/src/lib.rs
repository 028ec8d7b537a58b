//! LLM provider layer for Gon.
//!
//! # Architecture
//!
//! Control flow for one call:
//! `ProviderRouter` (pick model) → `OpenRouterClient` → `ResilientInvoker`
//! (timeout + circuit breaker) → `normalizer` (parse or fall back) →
//! `UsageStats` (record) → caller.
//!
//! - [`catalog`] — static model descriptors and use-case routing table
//! - [`circuit`] — rolling-window circuit breaker
//! - [`invoker::ResilientInvoker`] — one HTTP call with timeout/cancel/breaker
//! - [`normalizer`] — canonical result shaping and the canned fallback
//! - [`sse`] — `data:` line decoder for streaming responses
//! - [`openrouter::OpenRouterClient`] — OpenRouter chat completions
//! - [`router::ProviderRouter`] — use-case routing, fallback, usage accounting
//! - [`traits::ChatRouter`] — the seam the persona layer talks to

pub mod catalog;
pub mod circuit;
pub mod error;
pub mod invoker;
pub mod normalizer;
pub mod openrouter;
pub mod router;
pub mod sse;
pub mod stats;
pub mod traits;

// Re-export main types for convenience
pub use catalog::{ModelDescriptor, ModelSelector, UseCase, MODELS};
pub use circuit::{CircuitBreaker, CircuitEvent, CircuitSnapshot, CircuitState};
pub use error::{classify_failure, classify_message, FailureClass, InvokeError, ProviderError};
pub use invoker::ResilientInvoker;
pub use normalizer::FALLBACK_MESSAGE;
pub use openrouter::{GenerationParams, OpenRouterClient};
pub use router::{EngineHealth, HealthSnapshot, ProviderRouter};
pub use stats::{UsageSnapshot, UsageStats};
pub use traits::{ChatRouter, RouteOptions};
