//! `ChatRouter` trait — the seam between the persona layer and model routing.
//!
//! [`crate::router::ProviderRouter`] is the production implementation; tests
//! in the agent crate substitute a counting mock.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use gon_core::types::{LlmReply, Message};

use crate::catalog::UseCase;
use crate::error::ProviderError;

/// Per-call routing options.
#[derive(Clone, Debug, Default)]
pub struct RouteOptions {
    pub use_case: UseCase,
    /// Conversation language (e.g. `"pt-BR"`). A Portuguese hint overrides
    /// the use case.
    pub language_hint: Option<String>,
    /// Aborts the in-flight request when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl RouteOptions {
    pub fn new(use_case: UseCase) -> Self {
        Self {
            use_case,
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language_hint = Some(language.into());
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Something that turns a message list into a reply.
///
/// Runtime provider failures come back as a fallback [`LlmReply`]; only
/// contract errors (unknown model, empty request) are `Err`.
#[async_trait]
pub trait ChatRouter: Send + Sync {
    async fn route(
        &self,
        messages: &[Message],
        options: &RouteOptions,
    ) -> Result<LlmReply, ProviderError>;

    /// Streaming variant. `on_chunk` receives each content fragment as it
    /// arrives. The default routes normally and emits the whole reply once.
    async fn route_stream(
        &self,
        messages: &[Message],
        options: &RouteOptions,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<LlmReply, ProviderError> {
        let reply = self.route(messages, options).await?;
        on_chunk(&reply.content);
        Ok(reply)
    }
}
