//! Email bodies.

pub const RESET_PASSWORD_SUBJECT: &str = "Here is the link to reset your password.";

/// HTML body for the reset-password email
pub fn reset_password_email(name: &str, link: &str, ttl_minutes: u64) -> String {
    let name = escape_html(name);
    let link = escape_html(link);
    format!(
        "<p>Hello {name},</p>\
         <p>We received a request to reset the password for your account.</p>\
         <p><a href=\"{link}\">Reset your password</a></p>\
         <p>This link expires in {ttl_minutes} minutes and can only be used once. \
         If you did not request a reset, you can ignore this email.</p>"
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
