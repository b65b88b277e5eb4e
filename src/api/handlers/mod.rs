//! HTTP handlers for the `/auth` surface.

pub mod auth;

pub use auth::{
    fallback_handler, forgot_password_handler, login_handler, me_handler, refresh_handler,
    register_handler, reset_password_handler, LoginResponse, MessageResponse, RefreshResponse,
};
