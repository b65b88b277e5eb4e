//! Token codec: signed, self-contained bearer tokens (HS256 JWT).
//!
//! Every token carries `{sub, iat, exp, iss, scope}`. The `scope` claim is
//! inside the signed payload, so a refresh token can never be presented where
//! an access token is expected (and vice versa).
//!
//! Signature verification always runs before any expiry, scope or subject
//! check: a forged token is reported as invalid, never as expired.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuthConfig;
use crate::domain::Clock;
use crate::errors::{AuthErrorType, Error, Result};
use crate::observability::metrics;

/// Which use site a token is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // Account email
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub scope: TokenKind,
}

impl Claims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Issues and checks signed tokens with a single process-wide key.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("issuer", &self.issuer).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>, clock: Arc<dyn Clock>) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::config("Token signing secret cannot be empty"));
        }

        let issuer = issuer.into();
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock in `is_expired`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.set_issuer(&[issuer.as_str()]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer,
            clock,
        })
    }

    pub fn from_config(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new(config.jwt_secret.as_bytes(), config.jwt_issuer.clone(), clock)
    }

    /// Sign a token for `subject` valid from now until `now + ttl`.
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<IssuedToken> {
        let now = self.clock.now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
            scope: kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        metrics::record_token_issued(kind.as_str());

        Ok(IssuedToken { token, expires_at: claims.expires_at() })
    }

    /// Verify the signature and decode the claims. Expiry is not checked.
    pub fn parse(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(reason = ?err.kind(), "token failed signature or claim decoding");
                Error::auth("Invalid token", AuthErrorType::InvalidToken)
            })
    }

    pub fn is_expired(&self, claims: &Claims) -> bool {
        self.clock.now().timestamp() >= claims.exp
    }

    /// Parse, check expiry and compare the subject. Any failure is `false`.
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        match self.parse(token) {
            Ok(claims) => !self.is_expired(&claims) && claims.sub == expected_subject,
            Err(_) => false,
        }
    }

    /// Full check for a specific use site: signature, then scope, then expiry.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let claims = self.parse(token)?;

        if claims.scope != kind {
            debug!(expected = %kind, presented = %claims.scope, "token scope mismatch");
            return Err(Error::auth("Invalid token", AuthErrorType::InvalidToken));
        }

        if self.is_expired(&claims) {
            return Err(Error::auth("Token has expired", AuthErrorType::ExpiredToken));
        }

        Ok(claims)
    }
}
