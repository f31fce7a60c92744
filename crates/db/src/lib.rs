//! Postgres persistence for the fleet maintenance workflow.
//!
//! Models live in [`models`], zero-sized repositories in [`repositories`].
//! Guarded status transitions report their result through [`Guarded`].

use sqlx::postgres::PgPoolOptions;

pub mod child_ledger;
pub mod guard;
pub mod models;
pub mod repositories;

pub use child_ledger::ChildBatch;
pub use guard::Guarded;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
