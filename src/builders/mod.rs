//! Builders
//!
//! Fluent builders for configuration.

pub mod config;

pub use config::{oauth2_config, OAuth2ConfigBuilder};
