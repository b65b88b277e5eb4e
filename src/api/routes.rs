use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::{
    auth_service::AuthService,
    jwt::TokenCodec,
    middleware::{authenticate, RequestAuthenticator},
};
use crate::config::{AppConfig, ServerConfig};
use crate::domain::Clock;
use crate::errors::Result;
use crate::mail::{MailDispatcher, MailSender};
use crate::storage::{AccountRepository, DbPool, SqlxAccountRepository};

use super::handlers::{
    fallback_handler, forgot_password_handler, login_handler, me_handler, refresh_handler,
    register_handler, reset_password_handler,
};

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub authenticator: Arc<RequestAuthenticator>,
}

impl ApiState {
    /// Wire the services for one process. The signing key is loaded here,
    /// once, and shared read-only from then on.
    pub fn from_config(
        config: &AppConfig,
        pool: DbPool,
        mail_sender: Arc<dyn MailSender>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let accounts: Arc<dyn AccountRepository> = Arc::new(SqlxAccountRepository::new(pool));
        let codec = Arc::new(TokenCodec::from_config(&config.auth, clock.clone())?);
        let dispatcher = MailDispatcher::new(mail_sender, config.mail.timeout());

        Ok(Self {
            auth: Arc::new(AuthService::new(
                &config.auth,
                accounts.clone(),
                codec.clone(),
                clock,
                dispatcher,
            )),
            authenticator: Arc::new(RequestAuthenticator::new(codec, accounts)),
        })
    }
}

pub fn build_router(state: ApiState, server: &ServerConfig) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.authenticator.clone(), authenticate);

    let router = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/me", get(me_handler))
        .route("/auth/forgot-password", post(forgot_password_handler))
        .route("/auth/reset-password", put(reset_password_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http());

    if server.enable_cors {
        router.layer(cors_layer(&server.cors_origins))
    } else {
        router
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

