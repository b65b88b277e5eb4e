//! # Storage and Persistence
//!
//! SQLite connectivity, embedded migrations and the account repository.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use crate::config::DatabaseConfig;

pub use migrations::get_migration_version;
pub use pool::{create_pool, sanitize_url, DbPool};
pub use repositories::{AccountRepository, SqlxAccountRepository};

use crate::errors::Result;

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    migrations::run_migrations(pool).await
}
