//! Authentication module entry point.
//!
//! Exposes the token codec, credential checks, session issuance, password
//! reset flow and the request middleware.

pub mod account;
pub mod auth_service;
pub mod credentials;
mod hashing;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod reset;
pub mod session;
pub mod validation;

pub use account::{Account, AccountView, Profile};
pub use auth_service::AuthService;
pub use credentials::CredentialVerifier;
pub use jwt::{Claims, IssuedToken, TokenCodec, TokenKind};
pub use middleware::{Authentication, CurrentIdentity, RequestAuthenticator};
pub use models::Identity;
pub use reset::{ResetLink, ResetTokenManager};
pub use session::{RefreshHandler, RefreshedSession, SessionIssuer, SessionPolicy, SessionTokens};
