//! Model catalog — static descriptors for every routable OpenRouter model.
//!
//! Three families: free models (the default tier), Portuguese-optimized models
//! (reached through language/use-case routing), and paid models (used for
//! quality routing when free models are not preferred, and the only ones that
//! carry a cost estimate).

use serde::Serialize;

use crate::error::ProviderError;

// ─────────────────────────────────────────────
// ModelDescriptor
// ─────────────────────────────────────────────

/// Pricing tier of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Free,
    Portuguese,
    Paid,
}

/// Rough latency class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Fast,
    Medium,
}

/// Static description of one routable model.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Catalog key (e.g. `"llama-3.2-3b-free"`).
    pub key: &'static str,
    /// Model id sent to OpenRouter.
    pub provider_model_id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Context window in tokens.
    pub context_size: u32,
    pub speed: SpeedClass,
    pub family: ModelFamily,
    /// Price label as advertised (informational only).
    pub cost_label: &'static str,
    pub description: &'static str,
    /// Language tags the model handles well.
    pub languages: &'static [&'static str],
}

impl ModelDescriptor {
    /// Whether calls to this model cost money.
    pub fn is_paid(&self) -> bool {
        self.family == ModelFamily::Paid
    }

    /// Whether the model lists the given language tag (case-insensitive).
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }
}

// ─────────────────────────────────────────────
// Catalog entries
// ─────────────────────────────────────────────

/// All routable models: free first, then Portuguese-optimized, then paid.
pub static MODELS: &[ModelDescriptor] = &[
    // Free
    ModelDescriptor {
        key: "llama-3.2-3b-free",
        provider_model_id: "meta-llama/llama-3.2-3b-instruct:free",
        display_name: "Llama 3.2 3B (Free)",
        context_size: 131_072,
        speed: SpeedClass::Fast,
        family: ModelFamily::Free,
        cost_label: "FREE",
        description: "Fast and lightweight Llama model, perfect for quick responses",
        languages: &["en", "es", "pt", "fr", "de", "it"],
    },
    ModelDescriptor {
        key: "gemma-2-9b-free",
        provider_model_id: "google/gemma-2-9b-it:free",
        display_name: "Gemma 2 9B (Free)",
        context_size: 8_192,
        speed: SpeedClass::Fast,
        family: ModelFamily::Free,
        cost_label: "FREE",
        description: "Google Gemma 2 model, good quality responses",
        languages: &["en", "es", "pt", "fr", "de", "it", "pt-BR"],
    },
    ModelDescriptor {
        key: "qwen-2.5-72b-free",
        provider_model_id: "qwen/qwen-2.5-72b-instruct:free",
        display_name: "Qwen 2.5 72B (Free)",
        context_size: 32_768,
        speed: SpeedClass::Medium,
        family: ModelFamily::Free,
        cost_label: "FREE",
        description: "Powerful Qwen model, excellent for complex reasoning",
        languages: &["en", "es", "pt", "fr", "de", "it", "pt-BR", "zh", "ja", "ko"],
    },
    // Portuguese-optimized
    ModelDescriptor {
        key: "claude-3-haiku-pt",
        provider_model_id: "anthropic/claude-3-haiku:free",
        display_name: "Claude 3 Haiku (Portuguese)",
        context_size: 200_000,
        speed: SpeedClass::Fast,
        family: ModelFamily::Portuguese,
        cost_label: "FREE",
        description: "Excellent Portuguese understanding, very natural responses",
        languages: &["en", "pt", "pt-BR"],
    },
    ModelDescriptor {
        key: "gemini-1.5-flash-pt",
        provider_model_id: "google/gemini-1.5-flash:free",
        display_name: "Gemini 1.5 Flash (Portuguese)",
        context_size: 1_000_000,
        speed: SpeedClass::Fast,
        family: ModelFamily::Portuguese,
        cost_label: "FREE",
        description: "Google Gemini with excellent Portuguese support",
        languages: &["en", "pt", "pt-BR", "es"],
    },
    ModelDescriptor {
        key: "llama-3.1-8b-pt",
        provider_model_id: "meta-llama/llama-3.1-8b-instruct:free",
        display_name: "Llama 3.1 8B (Portuguese)",
        context_size: 8_192,
        speed: SpeedClass::Fast,
        family: ModelFamily::Portuguese,
        cost_label: "FREE",
        description: "Llama 3.1 with good Portuguese understanding",
        languages: &["en", "pt", "pt-BR", "es"],
    },
    // Paid
    ModelDescriptor {
        key: "qwen3-30b",
        provider_model_id: "qwen/qwen3-30b-a3b",
        display_name: "Qwen3 30B A3B",
        context_size: 40_960,
        speed: SpeedClass::Fast,
        family: ModelFamily::Paid,
        cost_label: "$0.02/$0.08 per 1M tokens",
        description: "Best balance of speed/quality/cost for daily use",
        languages: &["en", "pt", "pt-BR", "es", "fr", "de", "it", "zh", "ja", "ko"],
    },
    ModelDescriptor {
        key: "claude-3-sonnet",
        provider_model_id: "anthropic/claude-3-sonnet",
        display_name: "Claude 3 Sonnet",
        context_size: 200_000,
        speed: SpeedClass::Medium,
        family: ModelFamily::Paid,
        cost_label: "$0.003/$0.015 per 1K tokens",
        description: "Excellent Portuguese understanding and reasoning",
        languages: &["en", "pt", "pt-BR", "es", "fr", "de", "it"],
    },
];

/// Fastest free model.
const SPEED_MODEL: &str = "llama-3.2-3b-free";
/// Best free reasoning model.
const QUALITY_FREE_MODEL: &str = "qwen-2.5-72b-free";
/// Balanced free model; also the default for non-Portuguese languages.
const BALANCED_FREE_MODEL: &str = "gemma-2-9b-free";
/// Paid all-rounder for quality/balanced when free models are not preferred.
const PAID_MODEL: &str = "qwen3-30b";
/// Best Portuguese model.
const PORTUGUESE_MODEL: &str = "claude-3-haiku-pt";

// ─────────────────────────────────────────────
// Lookup
// ─────────────────────────────────────────────

/// Find a model by catalog key.
pub fn find_by_key(key: &str) -> Option<&'static ModelDescriptor> {
    MODELS.iter().find(|m| m.key == key)
}

/// Resolve a catalog key, failing with [`ProviderError::UnknownModel`].
pub fn resolve(key: &str) -> Result<&'static ModelDescriptor, ProviderError> {
    find_by_key(key).ok_or_else(|| ProviderError::UnknownModel(key.to_string()))
}

/// Models offered to users: free first, then paid.
pub fn available_models() -> Vec<&'static ModelDescriptor> {
    let free = MODELS.iter().filter(|m| m.family == ModelFamily::Free);
    let paid = MODELS.iter().filter(|m| m.family == ModelFamily::Paid);
    free.chain(paid).collect()
}

/// Whether a language tag means Portuguese (`pt`, `pt-BR`, `portuguese`).
pub fn is_portuguese(language: &str) -> bool {
    matches!(
        language.trim().to_lowercase().as_str(),
        "pt" | "pt-br" | "pt_br" | "portuguese"
    )
}

/// Best model for a conversation language. Outside Portuguese this is the
/// balanced free model, unless it lacks the language and another offered
/// model has it.
pub fn best_for_language(language: &str) -> &'static str {
    if is_portuguese(language) {
        return PORTUGUESE_MODEL;
    }
    match find_by_key(BALANCED_FREE_MODEL) {
        Some(m) if m.supports_language(language) => BALANCED_FREE_MODEL,
        _ => first_supporting(language).unwrap_or(BALANCED_FREE_MODEL),
    }
}

/// First offered model (free before paid) that lists `language`.
fn first_supporting(language: &str) -> Option<&'static str> {
    available_models()
        .into_iter()
        .find(|m| m.supports_language(language.trim()))
        .map(|m| m.key)
}

// ─────────────────────────────────────────────
// Use-case routing
// ─────────────────────────────────────────────

/// Caller-declared intent used to pick a model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCase {
    Speed,
    Quality,
    Free,
    Balanced,
    Portuguese,
    /// The configured default model.
    #[default]
    Default,
}

impl UseCase {
    pub const ALL: [UseCase; 6] = [
        UseCase::Speed,
        UseCase::Quality,
        UseCase::Free,
        UseCase::Balanced,
        UseCase::Portuguese,
        UseCase::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::Speed => "speed",
            UseCase::Quality => "quality",
            UseCase::Free => "free",
            UseCase::Balanced => "balanced",
            UseCase::Portuguese => "portuguese",
            UseCase::Default => "default",
        }
    }
}

impl std::fmt::Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UseCase {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UseCase::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProviderError::InvalidRequest(format!("unknown use case '{s}'")))
    }
}

/// Deterministic use-case → model table, parameterized by the configured
/// default model and the free-model preference.
#[derive(Clone, Debug)]
pub struct ModelSelector {
    default_model: String,
    prefer_free_models: bool,
}

impl ModelSelector {
    /// Build a selector. Fails if `default_model` is not in the catalog.
    pub fn new(default_model: &str, prefer_free_models: bool) -> Result<Self, ProviderError> {
        resolve(default_model)?;
        Ok(Self {
            default_model: default_model.to_string(),
            prefer_free_models,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Pick a catalog key. A Portuguese language hint wins over the use case;
    /// any other hint the use-case model lacks moves to a model that has it.
    pub fn best_for(&self, use_case: UseCase, language_hint: Option<&str>) -> &str {
        let Some(hint) = language_hint else {
            return self.for_use_case(use_case);
        };
        if is_portuguese(hint) {
            return PORTUGUESE_MODEL;
        }

        let key = self.for_use_case(use_case);
        let supported = find_by_key(key).is_some_and(|m| m.supports_language(hint.trim()));
        if supported || first_supporting(hint).is_none() {
            key
        } else {
            best_for_language(hint)
        }
    }

    fn for_use_case(&self, use_case: UseCase) -> &str {
        match use_case {
            UseCase::Speed | UseCase::Free => SPEED_MODEL,
            UseCase::Quality if self.prefer_free_models => QUALITY_FREE_MODEL,
            UseCase::Balanced if self.prefer_free_models => BALANCED_FREE_MODEL,
            UseCase::Quality | UseCase::Balanced => PAID_MODEL,
            UseCase::Portuguese => PORTUGUESE_MODEL,
            UseCase::Default => &self.default_model,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_models_have_unique_keys() {
        let mut keys: Vec<&str> = MODELS.iter().map(|m| m.key).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total, "Duplicate model keys found");
    }

    #[test]
    fn test_model_count() {
        assert_eq!(MODELS.len(), 8);
    }

    #[test]
    fn test_resolve_known() {
        let model = resolve("gemma-2-9b-free").unwrap();
        assert_eq!(model.provider_model_id, "google/gemma-2-9b-it:free");
        assert_eq!(model.context_size, 8_192);
        assert!(!model.is_paid());
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve("gpt-9000").unwrap_err();
        assert!(matches!(err, ProviderError::UnknownModel(ref k) if k == "gpt-9000"));
    }

    #[test]
    fn test_paid_flags() {
        assert!(resolve("qwen3-30b").unwrap().is_paid());
        assert!(resolve("claude-3-sonnet").unwrap().is_paid());
        assert!(!resolve("claude-3-haiku-pt").unwrap().is_paid());
    }

    #[test]
    fn test_every_use_case_resolves() {
        for prefer_free in [true, false] {
            for default in ["llama-3.2-3b-free", "qwen3-30b", "llama-3.1-8b-pt"] {
                let selector = ModelSelector::new(default, prefer_free).unwrap();
                for use_case in UseCase::ALL {
                    for hint in [None, Some("pt-BR"), Some("en"), Some("ja")] {
                        let key = selector.best_for(use_case, hint);
                        assert!(
                            find_by_key(key).is_some(),
                            "{use_case} with hint {hint:?} → dangling key {key}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_routing_table_prefer_free() {
        let selector = ModelSelector::new("llama-3.2-3b-free", true).unwrap();
        assert_eq!(selector.best_for(UseCase::Speed, None), "llama-3.2-3b-free");
        assert_eq!(selector.best_for(UseCase::Quality, None), "qwen-2.5-72b-free");
        assert_eq!(selector.best_for(UseCase::Free, None), "llama-3.2-3b-free");
        assert_eq!(selector.best_for(UseCase::Balanced, None), "gemma-2-9b-free");
        assert_eq!(selector.best_for(UseCase::Portuguese, None), "claude-3-haiku-pt");
        assert_eq!(selector.best_for(UseCase::Default, None), "llama-3.2-3b-free");
    }

    #[test]
    fn test_routing_table_paid() {
        let selector = ModelSelector::new("gemma-2-9b-free", false).unwrap();
        assert_eq!(selector.best_for(UseCase::Quality, None), "qwen3-30b");
        assert_eq!(selector.best_for(UseCase::Balanced, None), "qwen3-30b");
        assert_eq!(selector.best_for(UseCase::Speed, None), "llama-3.2-3b-free");
        assert_eq!(selector.best_for(UseCase::Default, None), "gemma-2-9b-free");
    }

    #[test]
    fn test_portuguese_hint_wins() {
        let selector = ModelSelector::new("llama-3.2-3b-free", true).unwrap();
        assert_eq!(selector.best_for(UseCase::Speed, Some("pt-BR")), "claude-3-haiku-pt");
        assert_eq!(selector.best_for(UseCase::Quality, Some("PT")), "claude-3-haiku-pt");
        assert_eq!(selector.best_for(UseCase::Speed, Some("en")), "llama-3.2-3b-free");
    }

    #[test]
    fn test_selector_rejects_unknown_default() {
        assert!(ModelSelector::new("nope", true).is_err());
    }

    #[test]
    fn test_best_for_language() {
        assert_eq!(best_for_language("portuguese"), "claude-3-haiku-pt");
        assert_eq!(best_for_language("pt-br"), "claude-3-haiku-pt");
        assert_eq!(best_for_language("en"), "gemma-2-9b-free");
        assert_eq!(best_for_language("ja"), "qwen-2.5-72b-free");
        assert_eq!(best_for_language("xx"), "gemma-2-9b-free");
    }

    #[test]
    fn test_hint_outside_model_languages_moves_model() {
        let selector = ModelSelector::new("llama-3.2-3b-free", true).unwrap();
        assert!(!resolve("llama-3.2-3b-free").unwrap().supports_language("ja"));
        assert_eq!(selector.best_for(UseCase::Speed, Some("ja")), "qwen-2.5-72b-free");
        assert_eq!(selector.best_for(UseCase::Speed, Some("fr")), "llama-3.2-3b-free");
        assert_eq!(selector.best_for(UseCase::Speed, Some("xx")), "llama-3.2-3b-free");

        let paid = ModelSelector::new("gemma-2-9b-free", false).unwrap();
        assert_eq!(paid.best_for(UseCase::Quality, Some("ko")), "qwen3-30b");
    }

    #[test]
    fn test_available_models_free_first() {
        let models = available_models();
        assert_eq!(models.len(), 5);
        assert!(models[..3].iter().all(|m| m.family == ModelFamily::Free));
        assert!(models[3..].iter().all(|m| m.is_paid()));
    }

    #[test]
    fn test_use_case_from_str() {
        assert_eq!("speed".parse::<UseCase>().unwrap(), UseCase::Speed);
        assert_eq!("Quality".parse::<UseCase>().unwrap(), UseCase::Quality);
        assert!("fastest".parse::<UseCase>().is_err());
    }

    #[test]
    fn test_supports_language() {
        let model = resolve("claude-3-haiku-pt").unwrap();
        assert!(model.supports_language("pt-br"));
        assert!(!model.supports_language("ja"));
    }
}
