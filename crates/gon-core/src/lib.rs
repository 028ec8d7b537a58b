//! Gon core — shared types, configuration, and helpers.
//!
//! - [`types`] — chat messages, provider wire format, replies and usage
//! - [`config`] — typed schema, JSON loader, env overrides, validation
//! - [`error`] — configuration errors (fatal at startup)
//! - [`utils`] — data paths and string helpers

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::Config;
pub use error::ConfigError;
