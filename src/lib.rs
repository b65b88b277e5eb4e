//! # Confido Auth
//!
//! Credential and session-token authority: email/password accounts, signed
//! access and refresh tokens, and a single-use password reset flow, served
//! over a small HTTP surface under `/auth`.
//!
//! ## Architecture
//!
//! ```text
//! HTTP (axum) → Request Authenticator → Handlers → AuthService
//!                                                    ↓
//!                    Token Codec · Credential Verifier · Reset Token Manager
//!                                                    ↓
//!                                   Account Repository (SQLx/SQLite) · Mail
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use confido_auth::{api, config::AppConfig, domain::SystemClock, mail, storage, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env();
//!     config.validate()?;
//!     let pool = storage::create_pool(&config.database).await?;
//!     let sender = mail::sender_from_config(&config.mail)?;
//!     let state = api::ApiState::from_config(&config, pool, sender, Arc::new(SystemClock))?;
//!     api::start_api_server(&config.server, api::build_router(state, &config.server)).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod mail;
pub mod observability;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
