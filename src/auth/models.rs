//! Request-scoped authentication data.

use chrono::{DateTime, Utc};

use crate::auth::jwt::Claims;
use crate::domain::AccountId;

/// The caller resolved from a valid access token.
///
/// Attached to request extensions by the request authenticator and handed to
/// business logic explicitly; there is no ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: AccountId,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn from_claims(account_id: AccountId, claims: &Claims) -> Self {
        Self {
            account_id,
            email: claims.sub.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        }
    }
}
