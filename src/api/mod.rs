//! # REST API Components
//!
//! HTTP routing, middleware wiring, and request/response handling for the
//! `/auth` surface.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorKind};
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
