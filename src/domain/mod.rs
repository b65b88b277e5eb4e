//! Domain layer
//!
//! Infrastructure-free building blocks shared by the auth services and the
//! storage layer.
//!
//! - `id`: type-safe account identifier
//! - `clock`: injectable time source for expiry checks

pub mod clock;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::AccountId;
