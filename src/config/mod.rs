//! # Configuration Management
//!
//! Environment-driven configuration for the Confido authentication service.
//! Every section falls back to its `Default` when a variable is absent or
//! cannot be parsed; [`AppConfig::validate`] rejects unusable combinations.

pub mod settings;

pub use settings::{
    AppConfig, AuthConfig, DatabaseConfig, MailConfig, MailProvider, ObservabilityConfig,
    ServerConfig, MIN_JWT_SECRET_LENGTH,
};
