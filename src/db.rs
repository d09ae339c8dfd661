use std::{fs, path::Path};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

pub async fn connect(sqlite_path: &str) -> anyhow::Result<SqlitePool> {
    if let Some(dir) = Path::new(sqlite_path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(sqlite_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Idempotent schema bootstrap, run once at startup.
pub async fn create_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    let query = "
        CREATE TABLE IF NOT EXISTS tracked_drivers (
            cust_id INTEGER PRIMARY KEY,
            display_name TEXT NOT NULL,
            added_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS channel_config (
            guild_id INTEGER PRIMARY KEY,
            channel_id INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS poll_state (
            cust_id INTEGER PRIMARY KEY,
            last_poll_ts INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS posted_results (
            subsession_id INTEGER NOT NULL,
            cust_id INTEGER NOT NULL,
            guild_id INTEGER NOT NULL,
            posted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (subsession_id, cust_id, guild_id)
        );
    ";

    sqlx::raw_sql(query).execute(pool).await?;
    info!("database tables initialized");

    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    // One connection so every query sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("couldn't open in-memory database");
    create_tables(&pool).await.expect("couldn't create tables");
    pool
}
