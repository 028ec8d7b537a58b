//! Provider error taxonomy.
//!
//! - [`InvokeError`] — what a single HTTP invocation can fail with.
//! - [`ProviderError`] — what the client/router surface to callers.
//! - [`classify_failure`] — the one place that decides whether an invocation
//!   failure is transient (answer with the canned fallback) or not.

use gon_core::ConfigError;
use thiserror::Error;

/// Failure of one outbound call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvokeError {
    /// The circuit breaker rejected the call without touching the network.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The per-call timeout elapsed and the request was aborted.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,

    /// Connection/transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-2xx status.
    #[error("OpenRouter API error: {status} - {body}")]
    Status { status: u16, body: String },

    /// The provider answered 2xx without a JSON content type.
    #[error("OpenRouter returned non-JSON response: {preview}")]
    NonJson { preview: String },

    /// The body claimed to be JSON but did not parse.
    #[error("Failed to parse OpenRouter response: {0}")]
    InvalidJson(String),
}

impl InvokeError {
    /// Whether this outcome should count against the circuit breaker.
    pub fn counts_as_failure(&self) -> bool {
        !matches!(self, InvokeError::CircuitOpen | InvokeError::Cancelled)
    }
}

/// Errors surfaced by the provider layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Model key not in the catalog. Caller bug.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// The response lacked `choices[0].message.content` or was not a chat completion.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The request itself was unusable (e.g. no messages). Caller bug.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    /// Contract and configuration errors are propagated; everything else is a
    /// runtime provider failure that the router masks with the fallback reply.
    pub fn is_contract_error(&self) -> bool {
        matches!(
            self,
            ProviderError::UnknownModel(_)
                | ProviderError::InvalidRequest(_)
                | ProviderError::Config(_)
        )
    }
}

/// How a failed invocation should be treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// Upstream is throttling or returned garbage; answer with the fallback.
    Transient,
    /// Anything else.
    Fatal,
}

/// Classify an invocation failure.
///
/// Transient: HTTP 429, a non-JSON body, or an error text mentioning
/// "rate limit" / "non-json" (case-insensitive).
pub fn classify_failure(err: &InvokeError) -> FailureClass {
    match err {
        InvokeError::Status { status: 429, .. } | InvokeError::NonJson { .. } => {
            FailureClass::Transient
        }
        other => classify_message(&other.to_string()),
    }
}

/// Classify a free-form error message by the same substring rule.
pub fn classify_message(message: &str) -> FailureClass {
    let text = message.to_lowercase();
    if text.contains("rate limit") || text.contains("non-json") {
        FailureClass::Transient
    } else {
        FailureClass::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit_status() {
        let err = InvokeError::Status {
            status: 429,
            body: "{}".into(),
        };
        assert_eq!(classify_failure(&err), FailureClass::Transient);
    }

    #[test]
    fn test_classify_rate_limit_text() {
        let err = InvokeError::Status {
            status: 400,
            body: r#"{"error":{"message":"Rate limit exceeded"}}"#.into(),
        };
        assert_eq!(classify_failure(&err), FailureClass::Transient);
    }

    #[test]
    fn test_classify_non_json() {
        let err = InvokeError::NonJson {
            preview: "<html>".into(),
        };
        assert_eq!(classify_failure(&err), FailureClass::Transient);
    }

    #[test]
    fn test_classify_fatal() {
        assert_eq!(
            classify_failure(&InvokeError::Timeout { timeout_ms: 10 }),
            FailureClass::Fatal
        );
        assert_eq!(classify_failure(&InvokeError::CircuitOpen), FailureClass::Fatal);
        let err = InvokeError::Status {
            status: 500,
            body: "internal".into(),
        };
        assert_eq!(classify_failure(&err), FailureClass::Fatal);
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(classify_message("RATE LIMIT hit"), FailureClass::Transient);
        assert_eq!(classify_message("Non-JSON reply"), FailureClass::Transient);
        assert_eq!(classify_message("model overloaded"), FailureClass::Fatal);
    }

    #[test]
    fn test_counts_as_failure() {
        assert!(InvokeError::Timeout { timeout_ms: 1 }.counts_as_failure());
        assert!(InvokeError::Network("refused".into()).counts_as_failure());
        assert!(!InvokeError::Cancelled.counts_as_failure());
        assert!(!InvokeError::CircuitOpen.counts_as_failure());
    }

    #[test]
    fn test_contract_errors() {
        assert!(ProviderError::UnknownModel("x".into()).is_contract_error());
        assert!(ProviderError::InvalidRequest("empty".into()).is_contract_error());
        assert!(ProviderError::Config(ConfigError::FeatureDisabled).is_contract_error());
        assert!(!ProviderError::MalformedResponse("no choices".into()).is_contract_error());
        assert!(!ProviderError::Invoke(InvokeError::CircuitOpen).is_contract_error());
    }
}
