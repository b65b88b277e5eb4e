//! Credential verification for email/password login.

use std::sync::{Arc, LazyLock};

use tracing::{instrument, warn};

use crate::auth::account::Account;
use crate::auth::hashing;
use crate::errors::{AuthErrorType, Error, Result};
use crate::observability::metrics;
use crate::storage::AccountRepository;

/// Pre-computed dummy hash for timing-safe account enumeration prevention.
/// An unknown email still pays for one Argon2 verification.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hashing::hash_password("dummy_startup_value")
        .unwrap_or_else(|_| "$argon2id$v=19$m=768,t=1,p=1$dW5rbm93bg$dW5rbm93bg".to_string())
});

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Checks an email/password pair against the stored digest.
#[derive(Clone)]
pub struct CredentialVerifier {
    accounts: Arc<dyn AccountRepository>,
}

impl CredentialVerifier {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Returns the account when the password matches and the account is enabled.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown email or a wrong password (indistinguishable)
    /// - `AccountDisabled` only after the password has been confirmed
    #[instrument(skip(self, email, password), fields(email = %Account::normalize_email(email)))]
    pub async fn verify(&self, email: &str, password: &str) -> Result<Account> {
        let email = Account::normalize_email(email);

        let credentials = match self.accounts.find_by_email(&email).await? {
            Some(credentials) => credentials,
            None => {
                if let Err(e) = hashing::verify_password(password, &DUMMY_HASH) {
                    warn!(error = %e, "dummy hash verification failed unexpectedly");
                }
                warn!("login attempt for unknown account");
                metrics::record_authentication("invalid_credentials");
                return Err(Error::auth(BAD_CREDENTIALS, AuthErrorType::InvalidCredentials));
            }
        };

        if !hashing::verify_password(password, &credentials.password_hash)? {
            warn!(account_id = %credentials.account.id, "login attempt with incorrect password");
            metrics::record_authentication("invalid_credentials");
            return Err(Error::auth(BAD_CREDENTIALS, AuthErrorType::InvalidCredentials));
        }

        if !credentials.account.enabled {
            warn!(account_id = %credentials.account.id, "login attempt for disabled account");
            metrics::record_authentication("account_disabled");
            return Err(Error::auth("Account is disabled", AuthErrorType::AccountDisabled));
        }

        Ok(credentials.account)
    }
}
