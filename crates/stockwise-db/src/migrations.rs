//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied by [`Database::new`](crate::Database::new) when
//! `DbConfig::run_migrations` is set.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   users, catalog, sales, stock movements,
//!                              returns, replacements
//! ```
//!
//! New schema changes go in a new `NNN_description.sql` file. Applied files
//! are checksummed by sqlx and must not be edited afterwards.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applied vs embedded schema versions, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migrations compiled into this binary.
    pub embedded: usize,
    /// Migrations recorded as successful in `_sqlx_migrations`.
    pub applied: usize,
    /// Highest applied version, if any.
    pub latest_version: Option<i64>,
}

impl MigrationStatus {
    /// Whether every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Applies pending migrations in version order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;

    info!(embedded = MIGRATOR.migrations.len(), "Schema is up to date");
    Ok(())
}

/// Reads the migration bookkeeping table.
///
/// ## Errors
/// Fails when `_sqlx_migrations` is missing (migrations never ran) or the
/// query fails.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let versions: Vec<i64> = sqlx::query_scalar(
        "SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version",
    )
    .fetch_all(pool)
    .await?;

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: versions.len(),
        latest_version: versions.last().copied(),
    })
}
