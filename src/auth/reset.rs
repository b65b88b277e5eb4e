//! Password reset tokens.
//!
//! The clear token only ever leaves the process inside the reset link; the
//! store keeps its SHA-256 digest and an expiry. Consumption is a single
//! conditional UPDATE, so a token succeeds at most once.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::auth::account::Account;
use crate::auth::hashing;
use crate::config::AuthConfig;
use crate::domain::Clock;
use crate::errors::{AuthErrorType, Error, Result};
use crate::observability::metrics;
use crate::storage::AccountRepository;

const TOKEN_BYTES: usize = 32;

/// Everything needed to mail a reset link to the account holder.
#[derive(Clone)]
pub struct ResetLink {
    pub link: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
}

impl fmt::Debug for ResetLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetLink")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("account_id", &self.account.id)
            .finish()
    }
}

#[derive(Clone)]
pub struct ResetTokenManager {
    accounts: Arc<dyn AccountRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    link_base: String,
}

impl ResetTokenManager {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        link_base: impl Into<String>,
    ) -> Self {
        Self { accounts, clock, ttl, link_base: link_base.into() }
    }

    pub fn from_config(
        config: &AuthConfig,
        accounts: Arc<dyn AccountRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(accounts, clock, config.reset_token_ttl(), config.reset_link_base.clone())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh token for `email`, replacing any outstanding one.
    ///
    /// Unknown and disabled accounts fail with `AccountNotFoundForReset`;
    /// callers facing the network must not reveal which.
    #[instrument(skip(self, email))]
    pub async fn issue_reset_token(&self, email: &str) -> Result<ResetLink> {
        let email = Account::normalize_email(email);
        let account = match self.accounts.find_by_email(&email).await? {
            Some(credentials) if credentials.account.enabled => credentials.account,
            _ => {
                metrics::record_password_reset("unknown_account");
                return Err(Error::auth(
                    "No active account for reset",
                    AuthErrorType::AccountNotFoundForReset,
                ));
            }
        };

        let token = generate_token();
        let expires_at = self.clock.now() + self.ttl;
        self.accounts.store_reset_token(&account.id, &digest_token(&token), expires_at).await?;

        metrics::record_password_reset("issued");
        info!(account_id = %account.id, %expires_at, "reset token issued");

        Ok(ResetLink { link: format!("{}{}", self.link_base, token), token, expires_at, account })
    }

    /// Set a new password if `token` is current, then invalidate it.
    #[instrument(skip(self, token, new_password))]
    pub async fn consume_reset_token(&self, token: &str, new_password: &str) -> Result<()> {
        let token_hash = digest_token(token);
        let credentials = match self.accounts.find_by_reset_token_hash(&token_hash).await? {
            Some(credentials) => credentials,
            None => {
                metrics::record_password_reset("invalid_token");
                return Err(invalid_reset_token());
            }
        };
        let account_id = credentials.account.id.clone();

        // A digest without an expiry cannot be trusted as current.
        let expired = credentials
            .reset_token_expires_at
            .map_or(true, |expires_at| self.clock.now() >= expires_at);
        if expired {
            warn!(%account_id, "expired reset token presented");
            metrics::record_password_reset("expired_token");
            return Err(Error::auth("Reset token has expired", AuthErrorType::ExpiredResetToken));
        }

        if !credentials.account.enabled {
            warn!(%account_id, "reset attempted for disabled account");
            metrics::record_password_reset("account_disabled");
            return Err(Error::auth("Account is disabled", AuthErrorType::AccountDisabled));
        }

        let password_hash = hashing::hash_password(new_password)?;
        if !self.accounts.consume_reset_token(&account_id, &token_hash, &password_hash).await? {
            warn!(%account_id, "reset token consumed concurrently");
            metrics::record_password_reset("invalid_token");
            return Err(invalid_reset_token());
        }

        metrics::record_password_reset("completed");
        info!(%account_id, "password reset completed");
        Ok(())
    }
}

fn invalid_reset_token() -> Error {
    Error::auth("Invalid reset token", AuthErrorType::InvalidResetToken)
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
