//! Account registry and the facade the HTTP handlers call.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::account::{
    Account, AccountView, ForgotPasswordRequest, LoginRequest, NewAccount, RefreshRequest,
    RegisterRequest, ResetPasswordRequest,
};
use crate::auth::credentials::CredentialVerifier;
use crate::auth::hashing;
use crate::auth::jwt::TokenCodec;
use crate::auth::models::Identity;
use crate::auth::reset::ResetTokenManager;
use crate::auth::session::{RefreshHandler, RefreshedSession, SessionIssuer, SessionPolicy, SessionTokens};
use crate::config::AuthConfig;
use crate::domain::{AccountId, Clock};
use crate::errors::{AuthErrorType, Error, Result};
use crate::mail::{reset_password_email, MailDispatcher, OutgoingMail, RESET_PASSWORD_SUBJECT};
use crate::storage::AccountRepository;

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent";
pub const RESET_PASSWORD_MESSAGE: &str = "Password has been reset successfully";

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    sessions: SessionIssuer,
    refresher: RefreshHandler,
    resets: ResetTokenManager,
    mail: MailDispatcher,
}

impl AuthService {
    pub fn new(
        config: &AuthConfig,
        accounts: Arc<dyn AccountRepository>,
        codec: Arc<TokenCodec>,
        clock: Arc<dyn Clock>,
        mail: MailDispatcher,
    ) -> Self {
        let policy = SessionPolicy::from_config(config);
        Self {
            sessions: SessionIssuer::new(
                CredentialVerifier::new(accounts.clone()),
                codec.clone(),
                policy,
            ),
            refresher: RefreshHandler::new(accounts.clone(), codec, policy),
            resets: ResetTokenManager::from_config(config, accounts.clone(), clock),
            accounts,
            mail,
        }
    }

    #[instrument(skip(self, request), fields(email = %Account::normalize_email(&request.email)))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountView> {
        request.validate().map_err(Error::from)?;

        let account = self
            .accounts
            .create_account(NewAccount {
                id: AccountId::new(),
                email: Account::normalize_email(&request.email),
                password_hash: hashing::hash_password(&request.password)?,
                profile: request.profile(),
            })
            .await?;

        info!(account_id = %account.id, "account registered");
        Ok(AccountView::from(&account))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<SessionTokens> {
        request.validate().map_err(Error::from)?;
        self.sessions.login(&request.email, &request.password).await
    }

    pub async fn refresh(&self, request: RefreshRequest) -> Result<RefreshedSession> {
        request.validate().map_err(Error::from)?;
        self.refresher.refresh(&request.refresh_token).await
    }

    /// Load the caller's own account. The identity comes from the handler,
    /// never from shared state.
    #[instrument(skip(self, identity), fields(account_id = %identity.account_id))]
    pub async fn current_account(&self, identity: &Identity) -> Result<AccountView> {
        match self.accounts.find_by_email(&identity.email).await? {
            Some(credentials) if credentials.account.id == identity.account_id => {
                Ok(AccountView::from(&credentials.account))
            }
            _ => Err(Error::not_found("account", identity.account_id.to_string())),
        }
    }

    /// Start a password reset. Unknown and disabled accounts are reported as
    /// success; the returned handle is present only when mail was queued.
    #[instrument(skip(self, request))]
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<Option<JoinHandle<()>>> {
        request.validate().map_err(Error::from)?;

        let link = match self.resets.issue_reset_token(&request.email).await {
            Ok(link) => link,
            Err(err) if err.is_auth(AuthErrorType::AccountNotFoundForReset) => {
                info!("password reset requested for unknown or disabled account");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let ttl_minutes = u64::try_from(self.resets.ttl().num_minutes()).unwrap_or_default();
        let handle = self.mail.dispatch(OutgoingMail {
            to: link.account.email.clone(),
            subject: RESET_PASSWORD_SUBJECT.to_string(),
            content: reset_password_email(&link.account.display_name(), &link.link, ttl_minutes),
        });
        Ok(Some(handle))
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate().map_err(Error::from)?;
        self.resets.consume_reset_token(&request.token, &request.password).await
    }

    /// Administrative toggle; not exposed over HTTP.
    #[instrument(skip(self))]
    pub async fn set_account_enabled(&self, email: &str, enabled: bool) -> Result<()> {
        let email = Account::normalize_email(email);
        if !self.accounts.set_enabled(&email, enabled).await? {
            warn!("status change for unknown account");
            return Err(Error::not_found("account", email));
        }
        info!(enabled, "account status changed");
        Ok(())
    }
}
