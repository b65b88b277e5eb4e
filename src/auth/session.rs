//! Session issuance (login) and access-token refresh.
//!
//! Both are stateless: the only artifacts are the signed tokens themselves.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, instrument, warn};

use crate::auth::account::Account;
use crate::auth::credentials::CredentialVerifier;
use crate::auth::jwt::{IssuedToken, TokenCodec, TokenKind};
use crate::config::AuthConfig;
use crate::errors::{AuthErrorType, Error, Result};
use crate::observability::metrics;
use crate::storage::AccountRepository;

/// Lifetimes applied to newly issued tokens.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub rotate_refresh_tokens: bool,
}

impl SessionPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access_ttl: config.access_token_ttl(),
            refresh_ttl: config.refresh_token_ttl(),
            rotate_refresh_tokens: config.rotate_refresh_tokens,
        }
    }
}

/// Access/refresh pair returned by a successful login.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Result of a refresh. `refresh` is only present when rotation is enabled.
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub access: IssuedToken,
    pub refresh: Option<IssuedToken>,
}

/// Orchestrates login: credential check, then token issuance.
#[derive(Clone)]
pub struct SessionIssuer {
    verifier: CredentialVerifier,
    codec: Arc<TokenCodec>,
    policy: SessionPolicy,
}

impl SessionIssuer {
    pub fn new(verifier: CredentialVerifier, codec: Arc<TokenCodec>, policy: SessionPolicy) -> Self {
        Self { verifier, codec, policy }
    }

    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens> {
        let account = self.verifier.verify(email, password).await?;
        let tokens = self.issue_pair(&account)?;

        metrics::record_authentication("success");
        info!(account_id = %account.id, "login succeeded");
        Ok(tokens)
    }

    fn issue_pair(&self, account: &Account) -> Result<SessionTokens> {
        Ok(SessionTokens {
            access: self.codec.issue(&account.email, TokenKind::Access, self.policy.access_ttl)?,
            refresh: self.codec.issue(&account.email, TokenKind::Refresh, self.policy.refresh_ttl)?,
        })
    }
}

/// Exchanges a refresh token for a new access token without a password.
#[derive(Clone)]
pub struct RefreshHandler {
    accounts: Arc<dyn AccountRepository>,
    codec: Arc<TokenCodec>,
    policy: SessionPolicy,
}

impl RefreshHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        codec: Arc<TokenCodec>,
        policy: SessionPolicy,
    ) -> Self {
        Self { accounts, codec, policy }
    }

    /// # Errors
    ///
    /// - `InvalidToken` for a bad signature, wrong scope, or a subject that no
    ///   longer exists or is disabled
    /// - `ExpiredToken` for an authentic refresh token past its expiry
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedSession> {
        let claims = self.codec.verify(refresh_token, TokenKind::Refresh).inspect_err(|err| {
            warn!(reason = ?err.auth_error_type(), "refresh token rejected");
            metrics::record_authentication("refresh_rejected");
        })?;

        let account = match self.accounts.find_by_email(&claims.sub).await? {
            Some(credentials) if credentials.account.enabled => credentials.account,
            Some(credentials) => {
                warn!(account_id = %credentials.account.id, "refresh for disabled account");
                metrics::record_authentication("refresh_rejected");
                return Err(Error::auth("Invalid token", AuthErrorType::InvalidToken));
            }
            None => {
                warn!("refresh for unknown subject");
                metrics::record_authentication("refresh_rejected");
                return Err(Error::auth("Invalid token", AuthErrorType::InvalidToken));
            }
        };

        let access = self.codec.issue(&account.email, TokenKind::Access, self.policy.access_ttl)?;
        let refresh = if self.policy.rotate_refresh_tokens {
            Some(self.codec.issue(&account.email, TokenKind::Refresh, self.policy.refresh_ttl)?)
        } else {
            None
        };

        metrics::record_authentication("refreshed");
        info!(account_id = %account.id, rotated = refresh.is_some(), "access token refreshed");
        Ok(RefreshedSession { access, refresh })
    }
}
