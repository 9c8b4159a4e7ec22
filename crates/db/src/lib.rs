//! PostgreSQL persistence for drawings and the conversion queues.
//!
//! Repositories are zero-sized structs taking `&PgPool`; the `Pg*`
//! adapters in [`adapters`] wrap them behind the collaborator traits from
//! `draftline-core`.

use sqlx::postgres::PgPoolOptions;

pub mod adapters;
pub mod models;
pub mod repositories;

pub use adapters::{PgJobQueue, PgRecordStore, PgResultQueue};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
