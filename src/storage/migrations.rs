//! # Database Migration Management
//!
//! Schema migrations are embedded in the binary and applied in version order
//! on startup when `auto_migrate` is enabled. Applied versions are tracked in
//! `_confido_migrations` together with a checksum of the SQL that ran.

use crate::errors::{Error, Result};
use crate::storage::DbPool;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 20250101000001,
        description: "create_accounts",
        sql: include_str!("../../migrations/20250101000001_create_accounts.sql"),
    },
    Migration {
        version: 20250101000002,
        description: "create_profiles",
        sql: include_str!("../../migrations/20250101000002_create_profiles.sql"),
    },
];

/// Run all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    create_migration_table(pool).await?;

    let applied = applied_migrations(pool).await?;
    let mut migrations_run = 0;

    for migration in MIGRATIONS {
        let checksum = calculate_checksum(migration.sql);

        if let Some((_, recorded)) = applied.iter().find(|(version, _)| *version == migration.version)
        {
            if *recorded != checksum {
                warn!(
                    version = migration.version,
                    description = migration.description,
                    "Applied migration differs from the embedded version"
                );
            }
            continue;
        }

        info!(version = migration.version, "Running migration: {}", migration.description);
        let start_time = std::time::Instant::now();

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| Error::database(e, "Failed to start migration transaction"))?;

        sqlx::raw_sql(migration.sql).execute(&mut *tx).await.map_err(|e| {
            error!(error = %e, migration = migration.description, "Migration failed");
            Error::database(e, format!("Migration failed: {}", migration.description))
        })?;

        let execution_time = start_time.elapsed().as_millis() as i64;
        sqlx::query(
            "INSERT INTO _confido_migrations (version, description, checksum, execution_time, installed_on) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(migration.version)
        .bind(migration.description)
        .bind(&checksum)
        .bind(execution_time)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            Error::database(e, format!("Failed to record migration: {}", migration.description))
        })?;

        tx.commit()
            .await
            .map_err(|e| Error::database(e, "Failed to commit migration transaction"))?;

        migrations_run += 1;
        info!(
            version = migration.version,
            execution_time_ms = execution_time,
            "Migration completed: {}",
            migration.description
        );
    }

    if migrations_run > 0 {
        info!(count = migrations_run, "Database migrations completed");
    } else {
        info!("No pending migrations");
    }

    Ok(())
}

/// Highest applied migration version, if any
pub async fn get_migration_version(pool: &DbPool) -> Result<Option<i64>> {
    sqlx::query_scalar("SELECT MAX(version) FROM _confido_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::database(e, "Failed to read migration version"))
}

async fn create_migration_table(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _confido_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            checksum TEXT NOT NULL,
            execution_time INTEGER NOT NULL,
            installed_on TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| Error::database(e, "Failed to create migration tracking table"))?;

    Ok(())
}

async fn applied_migrations(pool: &DbPool) -> Result<Vec<(i64, String)>> {
    sqlx::query_as::<_, (i64, String)>(
        "SELECT version, checksum FROM _confido_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::database(e, "Failed to list applied migrations"))
}

fn calculate_checksum(sql: &str) -> String {
    hex::encode(Sha256::digest(sql.as_bytes()))
}
