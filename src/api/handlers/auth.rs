use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::extract::JsonBody;
use crate::api::routes::ApiState;
use crate::auth::account::{
    AccountView, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    ResetPasswordRequest,
};
use crate::auth::auth_service::{FORGOT_PASSWORD_MESSAGE, RESET_PASSWORD_MESSAGE};
use crate::auth::middleware::CurrentIdentity;
use crate::auth::session::{RefreshedSession, SessionTokens};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_in: DateTime<Utc>,
    pub refresh_token_expires_in: DateTime<Utc>,
}

impl From<SessionTokens> for LoginResponse {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            access_token: tokens.access.token,
            refresh_token: tokens.refresh.token,
            access_token_expires_in: tokens.access.expires_at,
            refresh_token_expires_in: tokens.refresh.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub access_token_expires_in: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_in: Option<DateTime<Utc>>,
}

impl From<RefreshedSession> for RefreshResponse {
    fn from(session: RefreshedSession) -> Self {
        let (refresh_token, refresh_token_expires_in) = match session.refresh {
            Some(refresh) => (Some(refresh.token), Some(refresh.expires_at)),
            None => (None, None),
        };
        Self {
            access_token: session.access.token,
            refresh_token,
            access_token_expires_in: session.access.expires_at,
            refresh_token_expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self { message: message.to_string() })
    }
}

#[instrument(skip(state, payload))]
pub async fn register_handler(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountView>), ApiError> {
    let view = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state, payload))]
pub async fn login_handler(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let tokens = state.auth.login(payload).await?;
    Ok(Json(tokens.into()))
}

#[instrument(skip(state, payload))]
pub async fn refresh_handler(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let session = state.auth.refresh(payload).await?;
    Ok(Json(session.into()))
}

#[instrument(skip(state, identity), fields(account_id = %identity.account_id))]
pub async fn me_handler(
    State(state): State<ApiState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<AccountView>, ApiError> {
    let view = state.auth.current_account(&identity).await?;
    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password_handler(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    // Delivery runs detached; the response never depends on it.
    let _delivery = state.auth.forgot_password(payload).await?;
    Ok(MessageResponse::new(FORGOT_PASSWORD_MESSAGE))
}

#[instrument(skip(state, payload))]
pub async fn reset_password_handler(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.reset_password(payload).await?;
    Ok(MessageResponse::new(RESET_PASSWORD_MESSAGE))
}

/// Unknown paths: only an authenticated caller learns that nothing is there.
pub async fn fallback_handler(CurrentIdentity(_): CurrentIdentity) -> ApiError {
    ApiError::not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::IssuedToken;

    fn issued(token: &str, secs: i64) -> IssuedToken {
        IssuedToken {
            token: token.to_string(),
            expires_at: DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn login_response_uses_camel_case_instants() {
        let response = LoginResponse::from(SessionTokens {
            access: issued("a", 3600),
            refresh: issued("r", 604_800),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["accessTokenExpiresIn"], "2023-11-14T23:13:20Z");
    }

    #[test]
    fn refresh_response_omits_absent_refresh_token() {
        let response = RefreshResponse::from(RefreshedSession { access: issued("a", 60), refresh: None });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert!(json.get("refreshToken").is_none());
        assert!(json.get("refreshTokenExpiresIn").is_none());
    }
}
