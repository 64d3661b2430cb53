use std::path::{Path, PathBuf};

use log::debug;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

pub const IN_MEMORY: &str = ":memory:";

/// Where the destination store lives. Passed explicitly to every consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(IN_MEMORY)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("cafe_sales.db")
    }
}

pub fn open(config: &DatabaseConfig) -> Result<Connection> {
    debug!("Opening database {:?}", config.path);
    let conn = if config.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        Connection::open(&config.path)?
    };
    Ok(conn)
}

pub fn server_version(conn: &Connection) -> Result<String> {
    let version = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
    Ok(version)
}

/// Double-quotes an identifier, doubling any embedded quote.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn ensure_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(EtlError::InvalidTableName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn row_count(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}
