use log::info;
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    database::{quote_identifier, row_count, table_exists},
    error::{EtlError, Result},
    record::TOTAL_SPENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub rows: i64,
    pub null_total_spent: i64,
}

/// Read-only quality checks on a loaded table: it must hold rows and no
/// `total_spent` may be null.
pub fn validate(conn: &Connection, table: &str) -> Result<ValidationSummary> {
    let failure = |reason: String| EtlError::Validation {
        table: table.to_string(),
        reason,
    };
    if !table_exists(conn, table)? {
        return Err(failure("table does not exist".to_string()));
    }
    let rows = row_count(conn, table)?;
    if rows == 0 {
        return Err(failure("no rows loaded".to_string()));
    }
    let null_total_spent: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
            quote_identifier(table),
            quote_identifier(TOTAL_SPENT)
        ),
        [],
        |row| row.get(0),
    )?;
    if null_total_spent > 0 {
        return Err(failure(format!(
            "{null_total_spent} row(s) with NULL {TOTAL_SPENT}"
        )));
    }
    info!("Validation passed for '{table}': {rows} row(s), 0 nulls in {TOTAL_SPENT}");
    Ok(ValidationSummary {
        rows,
        null_total_spent,
    })
}
