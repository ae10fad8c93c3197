//! Configuration module for the Gap runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the bot token, the REST endpoint, the webhook listener and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    GapConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, ServerConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
