//! Database migrations
//!
//! SQL is embedded at compile time and applied when a store is opened.

use memgate_core::Result;
use rusqlite::Connection;

use crate::store::db_error;

/// Vector store tables (001)
pub const MEMGATE_TABLES_SQL: &str = include_str!("001_memgate_tables.sql");

/// Run all migrations. Safe to call on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(MEMGATE_TABLES_SQL).map_err(db_error)?;
    Ok(())
}
