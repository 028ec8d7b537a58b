//! Configuration schema.
//!
//! Hierarchy: `Config` → `FeatureFlags`, `LlmConfig`, `OpenRouterConfig`,
//! `CircuitConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! Missing sections and fields take their defaults, so a partial file merges
//! over `Config::default()`. `Config::validate()` is the one place that checks
//! ranges.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConfigError;

/// Default OpenRouter API base URL.
pub const DEFAULT_OPENROUTER_BASE: &str = "https://openrouter.ai/api/v1";

/// Reply token ceiling when `llm.voiceOptimized` is on.
pub const VOICE_MAX_TOKENS: u32 = 100;

/// Env var consulted for the OpenRouter API key.
pub const OPENROUTER_KEY_ENV: &str = "OPENROUTER_API_KEY";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.gon/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub features: FeatureFlags,
    pub llm: LlmConfig,
    pub openrouter: OpenRouterConfig,
    pub circuit: CircuitConfig,
}

impl Config {
    /// Check every numeric range. Does not look at the API key; see
    /// [`Config::require_openrouter`] for that.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.openrouter.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::OutOfRange {
                field: "openrouter.temperature",
                value: temperature.to_string(),
                range: "0.0 ..= 2.0",
            });
        }
        if self.openrouter.max_tokens == 0 {
            return Err(ConfigError::OutOfRange {
                field: "openrouter.maxTokens",
                value: "0".into(),
                range: ">= 1",
            });
        }
        if self.llm.cloud_timeout_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "llm.cloudTimeoutMs",
                value: "0".into(),
                range: ">= 1",
            });
        }

        let circuit = &self.circuit;
        if circuit.error_threshold_percentage == 0 || circuit.error_threshold_percentage > 100 {
            return Err(ConfigError::OutOfRange {
                field: "circuit.errorThresholdPercentage",
                value: circuit.error_threshold_percentage.to_string(),
                range: "1 ..= 100",
            });
        }
        if circuit.volume_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                field: "circuit.volumeThreshold",
                value: "0".into(),
                range: ">= 1",
            });
        }
        if circuit.window_size < circuit.volume_threshold {
            return Err(ConfigError::OutOfRange {
                field: "circuit.windowSize",
                value: circuit.window_size.to_string(),
                range: ">= circuit.volumeThreshold",
            });
        }

        Ok(())
    }

    /// Fail-fast check before building a cloud client: the feature must be on
    /// and a key must be present.
    pub fn require_openrouter(&self) -> Result<&OpenRouterConfig, ConfigError> {
        if !self.features.openrouter_enabled {
            return Err(ConfigError::FeatureDisabled);
        }
        if !self.openrouter.is_configured() {
            return Err(ConfigError::MissingApiKey {
                env_var: OPENROUTER_KEY_ENV,
            });
        }
        Ok(&self.openrouter)
    }
}

// ─────────────────────────────────────────────
// Feature flags
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    /// Whether the OpenRouter cloud provider may be used.
    pub openrouter_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            openrouter_enabled: true,
        }
    }
}

// ─────────────────────────────────────────────
// LLM manager
// ─────────────────────────────────────────────

/// Routing policy for the LLM layer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    /// Prefer a local engine. Accepted for compatibility; there is no local
    /// engine, so this is ignored.
    pub prefer_local: bool,
    /// Use the cloud provider when local is unavailable.
    pub fallback_to_cloud: bool,
    /// Clamp replies short for spoken output.
    pub voice_optimized: bool,
    /// Per-call timeout for the cloud provider, in milliseconds.
    pub cloud_timeout_ms: u64,
    /// Conversation language (BCP-47 style, e.g. `"pt-BR"`).
    pub language: String,
    /// Route by the detected language of each user message.
    pub route_by_language: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            prefer_local: false,
            fallback_to_cloud: true,
            voice_optimized: true,
            cloud_timeout_ms: 15_000,
            language: "pt-BR".to_string(),
            route_by_language: false,
        }
    }
}

impl LlmConfig {
    /// Token budget for a reply. Voice mode clamps to [`VOICE_MAX_TOKENS`] so
    /// spoken answers stay short.
    pub fn clamp_max_tokens(&self, configured: u32) -> u32 {
        if self.voice_optimized {
            configured.min(VOICE_MAX_TOKENS)
        } else {
            configured
        }
    }
}

// ─────────────────────────────────────────────
// OpenRouter
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenRouterConfig {
    /// API key for Bearer authentication.
    pub api_key: String,
    /// API base URL (defaults to the public OpenRouter endpoint).
    pub api_base: String,
    /// Catalog key of the model used when no use-case applies.
    pub default_model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Choose free models for quality/balanced routing.
    pub prefer_free_models: bool,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENROUTER_BASE.to_string(),
            default_model: "llama-3.2-3b-free".to_string(),
            temperature: 0.7,
            max_tokens: 150,
            prefer_free_models: true,
            extra_headers: None,
        }
    }
}

impl OpenRouterConfig {
    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// ─────────────────────────────────────────────
// Circuit breaker
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CircuitConfig {
    /// Open when the failure rate in the window exceeds this percentage.
    pub error_threshold_percentage: u32,
    /// Minimum calls in the window before the rate is evaluated.
    pub volume_threshold: u32,
    /// Number of most recent outcomes kept in the rolling window.
    pub window_size: u32,
    /// How long the circuit stays open before allowing a probe.
    pub reset_timeout_ms: u64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            error_threshold_percentage: 50,
            volume_threshold: 5,
            window_size: 10,
            reset_timeout_ms: 30_000,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.openrouter.api_key = "sk-or-test".into();
        config
    }

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.features.openrouter_enabled);
        assert!(config.llm.voice_optimized);
        assert_eq!(config.llm.cloud_timeout_ms, 15_000);
        assert_eq!(config.openrouter.default_model, "llama-3.2-3b-free");
        assert_eq!(config.openrouter.api_base, DEFAULT_OPENROUTER_BASE);
        assert_eq!(config.circuit.volume_threshold, 5);
        assert_eq!(config.circuit.reset_timeout_ms, 30_000);
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut config = Config::default();
        config.openrouter.temperature = 2.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { field: "openrouter.temperature", .. }
        ));

        config.openrouter.temperature = -0.1;
        assert!(config.validate().is_err());

        config.openrouter.temperature = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_tokens_rejected() {
        let mut config = Config::default();
        config.openrouter.max_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_circuit_ranges() {
        let mut config = Config::default();
        config.circuit.error_threshold_percentage = 101;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.circuit.window_size = 3;
        config.circuit.volume_threshold = 5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "circuit.windowSize", .. })
        ));
    }

    #[test]
    fn test_require_openrouter_missing_key() {
        let config = Config::default();
        assert_eq!(
            config.require_openrouter().unwrap_err(),
            ConfigError::MissingApiKey {
                env_var: OPENROUTER_KEY_ENV
            }
        );
    }

    #[test]
    fn test_require_openrouter_disabled() {
        let mut config = configured();
        config.features.openrouter_enabled = false;
        assert_eq!(
            config.require_openrouter().unwrap_err(),
            ConfigError::FeatureDisabled
        );
    }

    #[test]
    fn test_require_openrouter_ok() {
        let config = configured();
        assert_eq!(config.require_openrouter().unwrap().api_key, "sk-or-test");
    }

    #[test]
    fn test_whitespace_key_is_not_configured() {
        let mut config = Config::default();
        config.openrouter.api_key = "   ".into();
        assert!(!config.openrouter.is_configured());
    }

    #[test]
    fn test_clamp_max_tokens() {
        let mut llm = LlmConfig::default();
        assert_eq!(llm.clamp_max_tokens(150), 100);
        assert_eq!(llm.clamp_max_tokens(60), 60);
        llm.voice_optimized = false;
        assert_eq!(llm.clamp_max_tokens(500), 500);
    }
}
