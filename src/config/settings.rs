//! # Configuration Settings
//!
//! Defines the configuration structure for the Confido authentication service.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Minimum length accepted for the HMAC signing secret
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Token and reset-flow configuration
    #[validate(nested)]
    pub auth: AuthConfig,

    /// Outbound mail configuration
    #[validate(nested)]
    pub mail: MailConfig,
}

impl AppConfig {
    /// Load every section from `CONFIDO_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load every section through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server: ServerConfig::from_lookup(&lookup),
            database: DatabaseConfig::from_lookup(&lookup),
            observability: ObservabilityConfig::from_lookup(&lookup),
            auth: AuthConfig::from_lookup(&lookup),
            mail: MailConfig::from_lookup(&lookup),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(|errors| {
            Error::config(format!("Invalid configuration: {}", Error::from(errors)))
        })?;

        self.validate_custom()
    }

    /// Cross-field checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if !self.database.is_sqlite() {
            return Err(Error::config("Database URL must start with 'sqlite:'"));
        }

        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(Error::config(format!(
                "JWT secret must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }

        if self.auth.access_token_ttl_seconds >= self.auth.refresh_token_ttl_seconds {
            return Err(Error::config("Access token TTL must be shorter than refresh token TTL"));
        }

        if self.mail.provider == MailProvider::Http
            && (self.mail.api_url.is_none() || self.mail.api_key.is_none())
        {
            return Err(Error::config("HTTP mail provider requires an API URL and an API key"));
        }

        if self.observability.enable_metrics && self.observability.metrics_port == self.server.port
        {
            return Err(Error::config("Server and metrics ports cannot be the same"));
        }

        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|value| value.trim().parse::<T>().ok()).unwrap_or(default)
}

fn flag_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            let value = value.trim().to_ascii_lowercase();
            value == "true" || value == "1"
        })
        .unwrap_or(default)
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Enable CORS
    pub enable_cors: bool,

    /// CORS allowed origins (empty = allow all)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let cors_origins = lookup("CONFIDO_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Self {
            host: lookup("CONFIDO_HOST").unwrap_or(defaults.host),
            port: parse_or(lookup, "CONFIDO_PORT", defaults.port),
            enable_cors: flag_or(lookup, "CONFIDO_ENABLE_CORS", defaults.enable_cors),
            cors_origins,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/confido.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            url: lookup("CONFIDO_DATABASE_URL").unwrap_or(defaults.url),
            max_connections: parse_or(
                lookup,
                "CONFIDO_DATABASE_MAX_CONNECTIONS",
                defaults.max_connections,
            ),
            min_connections: parse_or(
                lookup,
                "CONFIDO_DATABASE_MIN_CONNECTIONS",
                defaults.min_connections,
            ),
            connect_timeout_seconds: parse_or(
                lookup,
                "CONFIDO_DATABASE_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout_seconds,
            ),
            idle_timeout_seconds: parse_or(
                lookup,
                "CONFIDO_DATABASE_IDLE_TIMEOUT_SECONDS",
                defaults.idle_timeout_seconds,
            ),
            auto_migrate: flag_or(lookup, "CONFIDO_DATABASE_AUTO_MIGRATE", defaults.auto_migrate),
        }
    }

    /// Single-connection in-memory database, used by tests and ephemeral runs
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout_seconds: 0,
            ..Self::default()
        }
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a SQLite configuration
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to metrics and log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: 9090,
            service_name: "confido-auth".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            enable_metrics: flag_or(lookup, "CONFIDO_ENABLE_METRICS", defaults.enable_metrics),
            metrics_port: parse_or(lookup, "CONFIDO_METRICS_PORT", defaults.metrics_port),
            service_name: lookup("CONFIDO_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("CONFIDO_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: flag_or(lookup, "CONFIDO_JSON_LOGGING", defaults.json_logging),
        }
    }

    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

/// Token signing and password-reset configuration
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    /// HMAC secret for token signing/verification
    #[validate(length(min = 1, message = "JWT secret cannot be empty"))]
    pub jwt_secret: String,

    /// Issuer claim written into and required on every token
    #[validate(length(min = 1, message = "JWT issuer cannot be empty"))]
    pub jwt_issuer: String,

    /// Access token lifetime in seconds
    #[validate(range(
        min = 60,
        max = 86400,
        message = "Access token TTL must be between 1 minute and 24 hours"
    ))]
    pub access_token_ttl_seconds: u64,

    /// Refresh token lifetime in seconds
    #[validate(range(
        min = 300,
        max = 7776000,
        message = "Refresh token TTL must be between 5 minutes and 90 days"
    ))]
    pub refresh_token_ttl_seconds: u64,

    /// Issue a fresh refresh token on every refresh call
    pub rotate_refresh_tokens: bool,

    /// Password reset link lifetime in minutes
    #[validate(range(
        min = 1,
        max = 1440,
        message = "Reset token TTL must be between 1 minute and 24 hours"
    ))]
    pub reset_token_ttl_minutes: u64,

    /// Prefix the reset token is appended to when building the emailed link
    #[validate(length(min = 1, message = "Reset link base cannot be empty"))]
    pub reset_link_base: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .field("reset_token_ttl_minutes", &self.reset_token_ttl_minutes)
            .field("reset_link_base", &self.reset_link_base)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "confido".to_string(),
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_seconds: 7 * 24 * 3600,
            rotate_refresh_tokens: false,
            reset_token_ttl_minutes: 15,
            reset_link_base: "http://localhost:3000/reset-password?token=".to_string(),
        }
    }
}

impl AuthConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            jwt_secret: lookup("CONFIDO_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: lookup("CONFIDO_JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            access_token_ttl_seconds: parse_or(
                lookup,
                "CONFIDO_ACCESS_TOKEN_TTL_SECONDS",
                defaults.access_token_ttl_seconds,
            ),
            refresh_token_ttl_seconds: parse_or(
                lookup,
                "CONFIDO_REFRESH_TOKEN_TTL_SECONDS",
                defaults.refresh_token_ttl_seconds,
            ),
            rotate_refresh_tokens: flag_or(
                lookup,
                "CONFIDO_ROTATE_REFRESH_TOKENS",
                defaults.rotate_refresh_tokens,
            ),
            reset_token_ttl_minutes: parse_or(
                lookup,
                "CONFIDO_RESET_TOKEN_TTL_MINUTES",
                defaults.reset_token_ttl_minutes,
            ),
            reset_link_base: lookup("CONFIDO_RESET_LINK_BASE").unwrap_or(defaults.reset_link_base),
        }
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_ttl_seconds as i64)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_ttl_seconds as i64)
    }

    pub fn reset_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.reset_token_ttl_minutes as i64)
    }
}

/// Which [`crate::mail::MailSender`] the service wires up at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Log outgoing mail instead of delivering it
    Log,
    /// Deliver through a JSON mail API
    Http,
}

impl std::str::FromStr for MailProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(MailProvider::Log),
            "http" => Ok(MailProvider::Http),
            other => Err(Error::config(format!("Unknown mail provider '{}'", other))),
        }
    }
}

/// Outbound mail configuration
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct MailConfig {
    pub provider: MailProvider,

    /// Endpoint of the JSON mail API
    pub api_url: Option<String>,

    /// API key sent in the `api-key` header
    pub api_key: Option<String>,

    #[validate(email(message = "Sender email must be a valid address"))]
    pub sender_email: String,

    #[validate(length(min = 1, message = "Sender name cannot be empty"))]
    pub sender_name: String,

    /// Upper bound on a single delivery attempt
    #[validate(range(min = 1, max = 120, message = "Mail timeout must be between 1 and 120 seconds"))]
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::Log,
            api_url: None,
            api_key: None,
            sender_email: "no-reply@confido.local".to_string(),
            sender_name: "Confido".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl MailConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            provider: parse_or(lookup, "CONFIDO_MAIL_PROVIDER", defaults.provider),
            api_url: lookup("CONFIDO_MAIL_API_URL").or(defaults.api_url),
            api_key: lookup("CONFIDO_MAIL_API_KEY").or(defaults.api_key),
            sender_email: lookup("CONFIDO_MAIL_SENDER_EMAIL").unwrap_or(defaults.sender_email),
            sender_name: lookup("CONFIDO_MAIL_SENDER_NAME").unwrap_or(defaults.sender_name),
            timeout_seconds: parse_or(
                lookup,
                "CONFIDO_MAIL_TIMEOUT_SECONDS",
                defaults.timeout_seconds,
            ),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
