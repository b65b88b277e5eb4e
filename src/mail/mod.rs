//! # Outbound Mail
//!
//! The [`MailSender`] seam, its transports, message templates and the
//! dispatcher that keeps delivery off the request path.

pub mod dispatcher;
pub mod sender;
pub mod templates;

pub use dispatcher::{MailDispatcher, OutgoingMail};
pub use sender::{sender_from_config, HttpMailSender, LogMailSender, MailSender};
pub use templates::{reset_password_email, RESET_PASSWORD_SUBJECT};
