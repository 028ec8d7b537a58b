//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use gon_core::config;
//!
//! let cfg = config::load_config(None);
//! cfg.validate().expect("invalid configuration");
//! println!("Model: {}", cfg.openrouter.default_model);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{apply_env_overrides, get_config_path, load_config, save_config};
pub use schema::{CircuitConfig, Config, FeatureFlags, LlmConfig, OpenRouterConfig};
