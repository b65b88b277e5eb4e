//! # Structured Logging
//!
//! Subscriber setup plus span macros shared by the HTTP and storage layers.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Create a tracing span for request tracking.
///
/// ```rust,ignore
/// let span = request_span!("POST", "/auth/login");
/// ```
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            account_id = tracing::field::Empty
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            account_id = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Create a tracing span for database operations.
///
/// ```rust,ignore
/// let span = db_span!("consume_reset_token", account_id = %id);
/// ```
#[macro_export]
macro_rules! db_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => configured_filter(&config.log_level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true).with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))
}

fn configured_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| {
        Error::config_with_source(format!("Invalid log level '{}'", level), Box::new(e))
    })
}

/// Log the effective configuration with secrets redacted
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        bind_address = %config.server.bind_address(),
        database_url = %crate::storage::sanitize_url(&config.database.url),
        jwt_issuer = %config.auth.jwt_issuer,
        access_token_ttl_seconds = config.auth.access_token_ttl_seconds,
        refresh_token_ttl_seconds = config.auth.refresh_token_ttl_seconds,
        rotate_refresh_tokens = config.auth.rotate_refresh_tokens,
        reset_token_ttl_minutes = config.auth.reset_token_ttl_minutes,
        mail_provider = ?config.mail.provider,
        "Configuration loaded"
    );
}
