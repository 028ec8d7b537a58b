//! Core types for Gon — chat messages, the OpenAI-compatible wire format, and
//! the canonical reply records handed back to callers.
//!
//! The wire structs (`ChatCompletionRequest`, `ChatCompletionResponse`,
//! `ChatCompletionChunk`) mirror the `/chat/completions` JSON exactly. The
//! canonical structs (`InvocationResult`, `TokenUsage`, `LlmReply`) are what the
//! rest of the system passes around.

use serde::{Deserialize, Serialize};

/// Model id used for canned replies when the provider call failed.
pub const FALLBACK_MODEL: &str = "fallback";

/// Model id used for replies produced by the persona fast path.
pub const PERSONA_MODEL: &str = "gon-persona";

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Author of a chat message.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message in the OpenAI format (`{"role": ..., "content": ...}`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Wire format: request
// ─────────────────────────────────────────────

/// Request body for `POST {base}/chat/completions`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool,
}

// ─────────────────────────────────────────────
// Wire format: response
// ─────────────────────────────────────────────

/// Raw chat completion response. `choices` is required; a body without it
/// fails to deserialize and is treated as malformed.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage as reported by the provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One `data:` payload of a streaming response.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Set when the provider aborts the stream after the 200 status.
    #[serde(default)]
    pub error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
pub struct StreamError {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

// ─────────────────────────────────────────────
// Canonical results
// ─────────────────────────────────────────────

/// Token usage in canonical form, with an optional rough cost estimate.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// Approximate cost in USD. Only set for paid models; not billing-accurate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

impl TokenUsage {
    /// All counters zero, cost zero. Used by fallback replies.
    pub fn zeroed() -> Self {
        TokenUsage {
            estimated_cost: Some(0.0),
            ..Default::default()
        }
    }
}

impl From<UsageInfo> for TokenUsage {
    fn from(u: UsageInfo) -> Self {
        TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
            estimated_cost: None,
        }
    }
}

/// Normalized outcome of one provider invocation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub content: String,
    /// Model id reported by the provider, or [`FALLBACK_MODEL`].
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl InvocationResult {
    /// Whether this result is a canned fallback rather than a model reply.
    pub fn is_fallback(&self) -> bool {
        self.model == FALLBACK_MODEL
    }
}

/// Where a reply came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReplySource {
    /// A cloud provider answered.
    Cloud,
    /// The persona fast path answered without calling any provider.
    GonPersona,
    /// The provider failed and a canned apology was returned.
    Fallback,
}

/// What the router and persona overlay return to their callers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LlmReply {
    pub content: String,
    pub source: ReplySource,
    pub model: String,
    pub latency_ms: u64,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let msg = Message::system("Você é o Gon.");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "Você é o Gon.");

        let msg = Message::assistant("Oi!");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_message_deserialization() {
        let msg: Message = serde_json::from_value(json!({"role": "user", "content": "hello"})).unwrap();
        assert_eq!(msg, Message::user("hello"));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "meta-llama/llama-3.2-3b-instruct:free".to_string(),
            messages: vec![Message::system("be brief"), Message::user("hi")],
            max_tokens: 100,
            temperature: 0.7,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "meta-llama/llama-3.2-3b-instruct:free");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_parsing() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "gen-1",
            "model": "google/gemma-2-9b-it:free",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Olá!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }))
        .unwrap();

        assert_eq!(resp.model.as_deref(), Some("google/gemma-2-9b-it:free"));
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("Olá!"));
        assert_eq!(resp.usage.unwrap().total_tokens, 5);
    }

    #[test]
    fn test_response_without_choices_fails() {
        let parsed = serde_json::from_value::<ChatCompletionResponse>(json!({"id": "x"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_chunk_parsing() {
        let chunk: ChatCompletionChunk =
            serde_json::from_value(json!({"choices": [{"delta": {"content": "Ol"}}]})).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Ol"));

        let empty: ChatCompletionChunk =
            serde_json::from_value(json!({"choices": [{"delta": {}}]})).unwrap();
        assert!(empty.choices[0].delta.content.is_none());
    }

    #[test]
    fn test_usage_conversion_and_zeroed() {
        let usage: TokenUsage = UsageInfo {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }
        .into();
        assert_eq!(usage.total_tokens, 15);
        assert!(usage.estimated_cost.is_none());

        let zero = TokenUsage::zeroed();
        assert_eq!(zero.prompt_tokens, 0);
        assert_eq!(zero.total_tokens, 0);
        assert_eq!(zero.estimated_cost, Some(0.0));
    }

    #[test]
    fn test_reply_serializes_camel_case() {
        let reply = LlmReply {
            content: "Oi".into(),
            source: ReplySource::GonPersona,
            model: PERSONA_MODEL.into(),
            latency_ms: 0,
            fallback_used: false,
            usage: None,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["source"], "gon-persona");
        assert_eq!(json["latencyMs"], 0);
        assert_eq!(json["fallbackUsed"], false);
        assert!(json.get("usage").is_none());
    }

    #[test]
    fn test_invocation_result_is_fallback() {
        let result = InvocationResult {
            content: "x".into(),
            model: FALLBACK_MODEL.into(),
            usage: Some(TokenUsage::zeroed()),
        };
        assert!(result.is_fallback());
    }
}
