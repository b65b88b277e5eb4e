//! Validation helpers for account requests.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    // Email validation: basic RFC 5322 compliant pattern
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("EMAIL_REGEX should be a valid regex pattern");

    // Optional leading +, then digits with single spaces or dashes between groups
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]+(?:[ -][0-9]+)*$")
        .expect("PHONE_REGEX should be a valid regex pattern");
}

pub const PASSWORD_POLICY_MESSAGE: &str =
    "Password must be at least 8 characters and include uppercase, lowercase, number, and special character";

const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length to prevent DoS
const MAX_PASSWORD_LENGTH: usize = 128;

const PASSWORD_SPECIAL_CHARACTERS: &str = "@#$%^&+=!";

const MAX_PHONE_LENGTH: usize = 20;

fn policy_error(code: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(PASSWORD_POLICY_MESSAGE))
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email").with_message(Cow::Borrowed("Email must be valid")))
    }
}

/// Validate password strength
/// Requirements:
/// - Between 8 and 128 characters, no whitespace
/// - Contains at least one uppercase letter, one lowercase letter and one digit
/// - Contains at least one of `@#$%^&+=!`
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(policy_error("password_too_short"));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_long").with_message(Cow::Borrowed(
            "Password must be at most 128 characters",
        )));
    }

    if password.chars().any(char::is_whitespace) {
        return Err(policy_error("password_contains_whitespace"));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(policy_error("password_missing_uppercase"));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(policy_error("password_missing_lowercase"));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(policy_error("password_missing_digit"));
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c)) {
        return Err(policy_error("password_missing_special"));
    }

    Ok(())
}

pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if phone.len() <= MAX_PHONE_LENGTH && PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone_number")
            .with_message(Cow::Borrowed("Phone number must contain only digits, spaces or dashes")))
    }
}
