use color_eyre::{eyre::WrapErr, Result};
use sqlx::postgres::PgPoolOptions;

pub mod favorites;
pub mod login_states;
pub mod sessions;
pub mod users;

pub use sqlx;
pub use sqlx::PgPool;

#[tracing::instrument(err)]
pub async fn setup_db_pool() -> Result<PgPool> {
    let database_url =
        std::env::var("DATABASE_URL").wrap_err("DATABASE_URL must be set to start the server")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .wrap_err("Failed to connect to the database")?;

    const MIGRATION_LOCK_ID: i64 = 0xDB_DB_DB_DB_DB_DB_DB;
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&pool)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    let unlocked: bool = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .fetch_one(&pool)
        .await?;

    if unlocked {
        tracing::info!("Migration lock unlocked");
    } else {
        tracing::warn!("Failed to unlock migration lock");
    }

    Ok(pool)
}
