//! Configuration errors.
//!
//! Every variant here is fatal: the process should refuse to serve requests
//! rather than start with a broken provider setup.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The cloud provider is enabled but no API key was supplied.
    #[error("{env_var} is required. Set it in the environment or in the config file.")]
    MissingApiKey { env_var: &'static str },

    /// A cloud client was requested while the feature flag is off.
    #[error("OpenRouter is disabled. Set OPENROUTER_ENABLED=true to enable it.")]
    FeatureDisabled,

    /// A numeric setting is outside its allowed range.
    #[error("{field} = {value} is out of range ({range})")]
    OutOfRange {
        field: &'static str,
        value: String,
        range: &'static str,
    },

    /// The configured default model is not in the catalog.
    #[error("default model '{0}' is not in the model catalog")]
    UnknownDefaultModel(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
