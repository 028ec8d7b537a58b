//! Persona overlay — answers greetings and farewells itself, otherwise wraps
//! the conversation in Gon's system prompt and delegates to a [`ChatRouter`].
//!
//! The overlay holds no conversation state: each session owns its
//! [`ConversationHistory`] and passes it in.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use gon_core::types::{LlmReply, Message, ReplySource, Role, PERSONA_MODEL};
use gon_providers::{ChatRouter, ProviderError, RouteOptions, UseCase};

use crate::history::ConversationHistory;
use crate::intent::{classify_utterance, Utterance};
use crate::language::detect_language;
use crate::persona::Persona;

pub struct PersonaOverlay {
    router: Arc<dyn ChatRouter>,
    persona: Persona,
    use_case: UseCase,
    /// Pass the detected language of each message as a routing hint.
    route_by_language: bool,
}

impl PersonaOverlay {
    pub fn new(router: Arc<dyn ChatRouter>, persona: Persona) -> Self {
        Self {
            router,
            persona,
            use_case: UseCase::Default,
            route_by_language: false,
        }
    }

    pub fn with_use_case(mut self, use_case: UseCase) -> Self {
        self.use_case = use_case;
        self
    }

    pub fn with_language_routing(mut self, enabled: bool) -> Self {
        self.route_by_language = enabled;
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// The canned reply for a greeting or farewell, if `user_message` is one.
    pub fn canned_reply(&self, user_message: &str) -> Option<LlmReply> {
        let content = match classify_utterance(user_message) {
            Utterance::Greeting => &self.persona.greeting,
            Utterance::Farewell => &self.persona.farewell,
            Utterance::Other => return None,
        };
        Some(LlmReply {
            content: content.clone(),
            source: ReplySource::GonPersona,
            model: PERSONA_MODEL.to_string(),
            latency_ms: 0,
            fallback_used: false,
            usage: None,
        })
    }

    /// Answer one user turn and record it in `history`.
    ///
    /// On a contract error the history is left untouched.
    pub async fn respond(
        &self,
        user_message: &str,
        history: &mut ConversationHistory,
        cancel: Option<CancellationToken>,
    ) -> Result<LlmReply, ProviderError> {
        if let Some(reply) = self.fast_path(user_message, history) {
            return Ok(reply);
        }

        let messages = self.build_messages(user_message, history);
        let options = self.route_options(user_message, cancel);
        let reply = self.router.route(&messages, &options).await?;

        record_turn(history, user_message, &reply.content);
        Ok(reply)
    }

    /// Streaming variant of [`PersonaOverlay::respond`]. Canned replies are
    /// emitted as a single chunk.
    pub async fn respond_stream(
        &self,
        user_message: &str,
        history: &mut ConversationHistory,
        cancel: Option<CancellationToken>,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<LlmReply, ProviderError> {
        if let Some(reply) = self.fast_path(user_message, history) {
            on_chunk(&reply.content);
            return Ok(reply);
        }

        let messages = self.build_messages(user_message, history);
        let options = self.route_options(user_message, cancel);
        let reply = self
            .router
            .route_stream(&messages, &options, on_chunk)
            .await?;

        record_turn(history, user_message, &reply.content);
        Ok(reply)
    }

    fn fast_path(&self, user_message: &str, history: &mut ConversationHistory) -> Option<LlmReply> {
        let reply = self.canned_reply(user_message)?;
        info!(user_message, "Persona greeting/farewell response");
        record_turn(history, user_message, &reply.content);
        Some(reply)
    }

    /// `[system prompt, ...history, user message]`.
    fn build_messages(&self, user_message: &str, history: &ConversationHistory) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.persona.system_prompt()));
        messages.extend(history.as_messages());
        messages.push(Message::user(user_message));
        messages
    }

    fn route_options(&self, user_message: &str, cancel: Option<CancellationToken>) -> RouteOptions {
        let mut options = RouteOptions::new(self.use_case);
        if self.route_by_language {
            let language = detect_language(user_message);
            debug!(%language, "Detected message language");
            options = options.with_language(language.tag());
        }
        options.cancel = cancel;
        options
    }
}

fn record_turn(history: &mut ConversationHistory, user_message: &str, reply: &str) {
    history.push(Role::User, user_message);
    history.push(Role::Assistant, reply);
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts calls and remembers what it was asked.
    #[derive(Default)]
    struct MockRouter {
        calls: AtomicUsize,
        last_messages: Mutex<Vec<Message>>,
        last_hint: Mutex<Option<String>>,
        reject: bool,
    }

    #[async_trait]
    impl ChatRouter for MockRouter {
        async fn route(
            &self,
            messages: &[Message],
            options: &RouteOptions,
        ) -> Result<LlmReply, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_messages.lock().unwrap() = messages.to_vec();
            *self.last_hint.lock().unwrap() = options.language_hint.clone();
            if self.reject {
                return Err(ProviderError::InvalidRequest("rejected".into()));
            }
            Ok(LlmReply {
                content: "Resposta do modelo".into(),
                source: ReplySource::Cloud,
                model: "mock/model".into(),
                latency_ms: 42,
                fallback_used: false,
                usage: None,
            })
        }
    }

    fn overlay(router: Arc<MockRouter>) -> PersonaOverlay {
        PersonaOverlay::new(router, Persona::gon())
    }

    #[tokio::test]
    async fn test_greeting_bypasses_router() {
        let router = Arc::new(MockRouter::default());
        let overlay = overlay(router.clone());
        let mut history = ConversationHistory::new();

        let reply = overlay.respond("Oi", &mut history, None).await.unwrap();

        assert_eq!(
            reply.content,
            "Oi! Tudo bem? Eu sou o Gon, seu assistente pessoal! Como posso te ajudar hoje?"
        );
        assert_eq!(reply.latency_ms, 0);
        assert_eq!(reply.source, ReplySource::GonPersona);
        assert_eq!(reply.model, "gon-persona");
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_farewell_bypasses_router() {
        let router = Arc::new(MockRouter::default());
        let overlay = overlay(router.clone());
        let mut history = ConversationHistory::new();

        let reply = overlay.respond("tchau, Gon", &mut history, None).await.unwrap();
        assert_eq!(reply.content, "Até logo! Foi um prazer te ajudar!");
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_message_routes_with_prompt_and_history() {
        let router = Arc::new(MockRouter::default());
        let overlay = overlay(router.clone());
        let mut history = ConversationHistory::new();
        history.push(Role::User, "Qual seu nome?");
        history.push(Role::Assistant, "Gon!");

        let reply = overlay
            .respond("Me conta uma curiosidade sobre o Brasil", &mut history, None)
            .await
            .unwrap();
        assert_eq!(reply.content, "Resposta do modelo");
        assert_eq!(router.calls.load(Ordering::SeqCst), 1);

        let sent = router.last_messages.lock().unwrap().clone();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[0].content.starts_with("Você é o Gon"));
        assert_eq!(sent[1], Message::user("Qual seu nome?"));
        assert_eq!(sent[2], Message::assistant("Gon!"));
        assert_eq!(sent[3], Message::user("Me conta uma curiosidade sobre o Brasil"));

        assert_eq!(history.len(), 4);
        assert_eq!(history.get(3).unwrap().content, "Resposta do modelo");
    }

    #[tokio::test]
    async fn test_history_capped_in_prompt() {
        let router = Arc::new(MockRouter::default());
        let overlay = overlay(router.clone());
        let mut history = ConversationHistory::new();
        for i in 1..=12 {
            history.push(Role::User, format!("Message {i}"));
        }

        overlay
            .respond("Quanto é dois mais dois?", &mut history, None)
            .await
            .unwrap();
        let sent = router.last_messages.lock().unwrap().clone();
        // system + 10 history + user
        assert_eq!(sent.len(), 12);
        assert_eq!(sent[1].content, "Message 3");
    }

    #[tokio::test]
    async fn test_language_hint_only_when_enabled() {
        let router = Arc::new(MockRouter::default());
        let mut history = ConversationHistory::new();

        overlay(router.clone())
            .respond("Valeu mesmo, me explica isso por favor", &mut history, None)
            .await
            .unwrap();
        assert_eq!(*router.last_hint.lock().unwrap(), None);

        overlay(router.clone())
            .with_language_routing(true)
            .respond("Valeu mesmo, me explica isso por favor", &mut history, None)
            .await
            .unwrap();
        assert_eq!(router.last_hint.lock().unwrap().as_deref(), Some("pt-BR"));
    }

    #[tokio::test]
    async fn test_contract_error_leaves_history_untouched() {
        let router = Arc::new(MockRouter {
            reject: true,
            ..Default::default()
        });
        let overlay = overlay(router.clone());
        let mut history = ConversationHistory::new();

        let err = overlay
            .respond("Explain quantum computing", &mut history, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_respond_stream_uses_default_route_stream() {
        let router = Arc::new(MockRouter::default());
        let overlay = overlay(router.clone());
        let mut history = ConversationHistory::new();
        let mut chunks = Vec::new();

        let reply = overlay
            .respond_stream("Explain rust lifetimes", &mut history, None, &mut |c: &str| {
                chunks.push(c.to_string())
            })
            .await
            .unwrap();
        assert_eq!(chunks, vec!["Resposta do modelo"]);
        assert_eq!(reply.content, "Resposta do modelo");
    }

    #[tokio::test]
    async fn test_respond_stream_canned_emits_once() {
        let router = Arc::new(MockRouter::default());
        let overlay = overlay(router.clone());
        let mut history = ConversationHistory::new();
        let mut chunks = Vec::new();

        overlay
            .respond_stream("hello", &mut history, None, &mut |c: &str| {
                chunks.push(c.to_string())
            })
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    }
}
