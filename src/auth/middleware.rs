//! Axum middleware for request authentication.
//!
//! The middleware never rejects a request. It records the outcome of bearer
//! processing in the request extensions; route-level gating happens in the
//! [`CurrentIdentity`] extractor.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, field, warn, Instrument};

use crate::api::error::ApiError;
use crate::auth::jwt::{TokenCodec, TokenKind};
use crate::auth::models::Identity;
use crate::errors::AuthErrorType;
use crate::observability::metrics;
use crate::storage::AccountRepository;

const PUBLIC_ROUTES: &[&str] = &[
    "/auth/register",
    "/auth/login",
    "/auth/refresh",
    "/auth/forgot-password",
    "/auth/reset-password",
];

pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path.trim_end_matches('/'))
}

/// Shape of the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerHeader<'a> {
    Missing,
    Malformed,
    Token(&'a str),
}

impl<'a> BearerHeader<'a> {
    pub fn classify(value: Option<&'a str>) -> Self {
        let Some(value) = value else {
            return BearerHeader::Missing;
        };
        match value.strip_prefix("Bearer ").map(str::trim) {
            Some(token) if !token.is_empty() && !token.contains(' ') => BearerHeader::Token(token),
            _ => BearerHeader::Malformed,
        }
    }
}

/// Outcome of bearer processing, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// No usable header was sent
    Anonymous,
    /// A well-formed bearer token was sent but did not resolve to an account
    Rejected(AuthErrorType),
    Authenticated(Identity),
}

impl Authentication {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Authentication::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// The error a protected route reports for this outcome, if any.
    pub fn rejection(&self) -> Option<ApiError> {
        match self {
            Authentication::Authenticated(_) => None,
            Authentication::Rejected(_) => Some(ApiError::invalid_token()),
            Authentication::Anonymous => Some(ApiError::access_denied()),
        }
    }
}

/// Resolves bearer tokens to identities.
#[derive(Clone)]
pub struct RequestAuthenticator {
    codec: Arc<TokenCodec>,
    accounts: Arc<dyn AccountRepository>,
}

impl RequestAuthenticator {
    pub fn new(codec: Arc<TokenCodec>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { codec, accounts }
    }

    pub async fn authenticate(&self, header: Option<&str>) -> Authentication {
        let token = match BearerHeader::classify(header) {
            BearerHeader::Token(token) => token,
            BearerHeader::Missing => return Authentication::Anonymous,
            BearerHeader::Malformed => {
                debug!("ignoring malformed authorization header");
                metrics::record_authentication("malformed_bearer");
                return Authentication::Anonymous;
            }
        };

        let claims = match self.codec.verify(token, TokenKind::Access) {
            Ok(claims) => claims,
            Err(err) => {
                let kind = err.auth_error_type().unwrap_or(AuthErrorType::InvalidToken);
                warn!(reason = %kind, "bearer token rejected");
                metrics::record_authentication("bearer_rejected");
                return Authentication::Rejected(kind);
            }
        };

        match self.accounts.find_by_email(&claims.sub).await {
            Ok(Some(credentials))
                if credentials.account.enabled && credentials.account.email == claims.sub =>
            {
                Authentication::Authenticated(Identity::from_claims(
                    credentials.account.id,
                    &claims,
                ))
            }
            Ok(Some(credentials)) => {
                warn!(account_id = %credentials.account.id, "bearer token for disabled account");
                metrics::record_authentication("bearer_rejected");
                Authentication::Rejected(AuthErrorType::AccountDisabled)
            }
            Ok(None) => {
                warn!("bearer token for unknown subject");
                metrics::record_authentication("bearer_rejected");
                Authentication::Rejected(AuthErrorType::InvalidToken)
            }
            Err(err) => {
                error!(error = %err, "account lookup failed during authentication");
                Authentication::Rejected(AuthErrorType::InvalidToken)
            }
        }
    }
}

/// Middleware entry point that attaches the request's [`Authentication`].
pub async fn authenticate(
    State(authenticator): State<Arc<RequestAuthenticator>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if request.method() == Method::OPTIONS || is_public_route(&path) {
        return next.run(request).await;
    }

    let span = crate::request_span!(request.method(), path);

    let header = request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    let outcome = authenticator.authenticate(header).instrument(span.clone()).await;
    if let Some(identity) = outcome.identity() {
        span.record("account_id", field::display(&identity.account_id));
    }

    request.extensions_mut().insert(outcome);
    next.run(request).await
}

/// Extractor for routes that require an authenticated caller.
///
/// A missing or malformed header is `AccessDenied`; a bearer token that was
/// sent but rejected is `InvalidToken`.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Authentication>() {
            Some(Authentication::Authenticated(identity)) => Ok(CurrentIdentity(identity.clone())),
            Some(other) => Err(other.rejection().unwrap_or_else(ApiError::access_denied)),
            None => Err(ApiError::access_denied()),
        }
    }
}
