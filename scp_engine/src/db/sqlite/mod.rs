//! # SQLite database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or create an atomic transaction as
//! the need arises and pass `&mut tx` as the connection argument.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod complaints;
pub mod conversations;
mod db;
pub mod messages;
pub mod orders;
pub mod products;

pub use db::SqliteDatabase;

const SQLITE_DB_URL: &str = "sqlite://data/scp_store.db";

pub fn db_url() -> String {
    let result = env::var("SCP_DATABASE_URL").unwrap_or_else(|_| {
        info!("SCP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Applies any pending schema migrations to the given pool.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./src/db/sqlite/migrations").run(pool).await
}
