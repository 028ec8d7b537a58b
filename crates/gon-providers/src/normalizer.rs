//! Response normalizer — raw provider JSON → [`InvocationResult`], plus the
//! canned fallback used whenever a call fails transiently.

use serde_json::Value;
use tracing::{debug, warn};

use gon_core::types::{ChatCompletionResponse, InvocationResult, TokenUsage, FALLBACK_MODEL};

use crate::catalog::ModelDescriptor;
use crate::error::{classify_failure, classify_message, FailureClass, InvokeError, ProviderError};

/// Spoken when the provider could not answer.
pub const FALLBACK_MESSAGE: &str =
    "Desculpe, estou com problemas técnicos no momento. Pode tentar novamente em alguns segundos?";

/// Flat USD rate per million tokens used for the paid-model estimate.
/// Approximate; not a billing figure.
pub const AVERAGE_RATE_PER_MILLION: f64 = 0.05;

/// Rough cost for `total_tokens` on a paid model.
pub fn estimate_cost(total_tokens: u32) -> f64 {
    f64::from(total_tokens) / 1_000_000.0 * AVERAGE_RATE_PER_MILLION
}

/// The canned apology: model `"fallback"`, every usage field zero.
pub fn fallback_result() -> InvocationResult {
    InvocationResult {
        content: FALLBACK_MESSAGE.to_string(),
        model: FALLBACK_MODEL.to_string(),
        usage: Some(TokenUsage::zeroed()),
    }
}

/// Turn a transient invocation failure into the fallback; `None` otherwise.
pub fn recover(err: &InvokeError) -> Option<InvocationResult> {
    match classify_failure(err) {
        FailureClass::Transient => {
            warn!(error = %err, "Transient provider failure, using fallback reply");
            Some(fallback_result())
        }
        FailureClass::Fatal => None,
    }
}

/// Shape a chat-completion body into an [`InvocationResult`].
///
/// A body carrying an `error.message` that reads as transient (rate limit,
/// non-JSON) yields the fallback. Anything without a non-empty
/// `choices[0].message.content` is [`ProviderError::MalformedResponse`].
pub fn normalize(raw: Value, descriptor: &ModelDescriptor) -> Result<InvocationResult, ProviderError> {
    if let Some(message) = error_message(&raw) {
        if classify_message(&message) == FailureClass::Transient {
            warn!(model = descriptor.key, error = %message, "Provider reported transient error");
            return Ok(fallback_result());
        }
        return Err(ProviderError::MalformedResponse(format!(
            "provider error: {message}"
        )));
    }

    let response: ChatCompletionResponse = serde_json::from_value(raw)
        .map_err(|e| ProviderError::MalformedResponse(format!("not a chat completion: {e}")))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            ProviderError::MalformedResponse("missing choices[0].message.content".to_string())
        })?;

    let model = response
        .model
        .unwrap_or_else(|| descriptor.provider_model_id.to_string());

    let usage = response.usage.map(|u| {
        let mut usage = TokenUsage::from(u);
        if descriptor.is_paid() {
            usage.estimated_cost = Some(estimate_cost(usage.total_tokens));
        }
        usage
    });

    debug!(
        model = %model,
        total_tokens = usage.as_ref().map_or(0, |u| u.total_tokens),
        "Normalized provider response"
    );

    Ok(InvocationResult {
        content,
        model,
        usage,
    })
}

fn error_message(raw: &Value) -> Option<String> {
    let error = raw.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resolve;
    use serde_json::json;

    fn free() -> &'static ModelDescriptor {
        resolve("llama-3.2-3b-free").unwrap()
    }

    fn paid() -> &'static ModelDescriptor {
        resolve("qwen3-30b").unwrap()
    }

    #[test]
    fn test_normalize_success() {
        let raw = json!({
            "model": "meta-llama/llama-3.2-3b-instruct:free",
            "choices": [{"message": {"role": "assistant", "content": "Oi!"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        });
        let result = normalize(raw, free()).unwrap();
        assert_eq!(result.content, "Oi!");
        assert_eq!(result.model, "meta-llama/llama-3.2-3b-instruct:free");
        let usage = result.usage.unwrap();
        assert_eq!(usage.total_tokens, 15);
        assert!(usage.estimated_cost.is_none());
    }

    #[test]
    fn test_normalize_paid_estimates_cost() {
        let raw = json!({
            "choices": [{"message": {"content": "ok"}}],
            "usage": {"prompt_tokens": 600000, "completion_tokens": 400000, "total_tokens": 1000000}
        });
        let result = normalize(raw, paid()).unwrap();
        // Missing model → descriptor id
        assert_eq!(result.model, "qwen/qwen3-30b-a3b");
        let cost = result.usage.unwrap().estimated_cost.unwrap();
        assert!((cost - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_missing_choices_is_malformed() {
        let err = normalize(json!({"id": "gen-1"}), free()).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn test_normalize_empty_choices_is_malformed() {
        let err = normalize(json!({"choices": []}), free()).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn test_normalize_empty_content_is_malformed() {
        let raw = json!({"choices": [{"message": {"content": ""}}]});
        assert!(normalize(raw, free()).is_err());
        let raw = json!({"choices": [{"message": {"content": null}}]});
        assert!(normalize(raw, free()).is_err());
    }

    #[test]
    fn test_normalize_rate_limit_error_body_falls_back() {
        let raw = json!({"error": {"message": "Rate limit exceeded: free-models-per-min", "code": 429}});
        let result = normalize(raw, free()).unwrap();
        assert_eq!(result.model, "fallback");
        assert_eq!(result.content, FALLBACK_MESSAGE);
        let usage = result.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 0);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 0);
        assert_eq!(usage.estimated_cost, Some(0.0));
    }

    #[test]
    fn test_normalize_other_error_body_is_malformed() {
        let raw = json!({"error": {"message": "No endpoints found"}});
        let err = normalize(raw, free()).unwrap_err();
        assert!(err.to_string().contains("No endpoints found"));
    }

    #[test]
    fn test_recover_transient_only() {
        let rate_limited = InvokeError::Status {
            status: 429,
            body: "slow down".into(),
        };
        assert!(recover(&rate_limited).unwrap().is_fallback());
        assert!(recover(&InvokeError::NonJson { preview: "<html>".into() }).is_some());
        assert!(recover(&InvokeError::Timeout { timeout_ms: 10 }).is_none());
    }

    #[test]
    fn test_estimate_cost() {
        assert_eq!(estimate_cost(0), 0.0);
        assert!((estimate_cost(2_000_000) - 0.1).abs() < 1e-12);
    }
}
