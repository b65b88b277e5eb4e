//! # Error Handling
//!
//! Crate-wide error type built on `thiserror`. HTTP translation lives in
//! [`crate::api::error`] and nowhere else.

pub mod types;

pub use types::{AuthErrorType, Error, Result};
