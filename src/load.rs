//! Atomic, schema-inferring load of a [`CleanTable`] into the destination store.
//!
//! Table preparation (drop + create, or create-if-missing) and the bulk insert
//! share one transaction. On any failure the transaction rolls back, so the
//! destination keeps its pre-load state: no half-created table and no partial
//! row set. On success in [`LoadMode::Replace`] the prior contents are gone.
//!
//! A zero-row table is loaded as a no-op insert that still (re)creates the
//! empty destination; callers that consider this an error must check first.

use clap::ValueEnum;
use log::{debug, info};
use rusqlite::{
    Connection, Transaction, params_from_iter,
    types::{ToSql, ToSqlOutput},
};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Value, format_timestamp},
    database::{ensure_table_name, quote_identifier},
    error::{EtlError, Result},
    record::CleanTable,
    schema::{SchemaDescriptor, infer_schema},
};

pub const DEFAULT_TABLE: &str = "sales_data";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Drop the destination if it exists, then create it fresh.
    #[default]
    Replace,
    /// Create the destination only if missing, then insert.
    Append,
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Timestamp(ts) => ToSqlOutput::from(format_timestamp(ts)),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// Loads every row of `table` into `target` and returns the inserted count.
pub fn load(
    conn: &mut Connection,
    table: &CleanTable,
    target: &str,
    mode: LoadMode,
) -> Result<usize> {
    ensure_table_name(target)?;
    let schema = infer_schema(table);
    debug!("Inferred schema for '{target}': {}", schema.create_table_sql(target));

    let tx = conn
        .transaction()
        .map_err(|err| EtlError::load(target, err))?;
    let inserted =
        write_table(&tx, table, &schema, target, mode).map_err(|err| EtlError::load(target, err))?;
    tx.commit().map_err(|err| EtlError::load(target, err))?;

    info!(
        "Loaded {} row(s) into table '{}' ({:?})",
        inserted, target, mode
    );
    Ok(inserted)
}

fn write_table(
    tx: &Transaction<'_>,
    table: &CleanTable,
    schema: &SchemaDescriptor,
    target: &str,
    mode: LoadMode,
) -> rusqlite::Result<usize> {
    match mode {
        LoadMode::Replace => {
            tx.execute(
                &format!("DROP TABLE IF EXISTS {}", quote_identifier(target)),
                [],
            )?;
            tx.execute(&schema.create_table_sql(target), [])?;
        }
        LoadMode::Append => {
            tx.execute(&schema.create_table_if_missing_sql(target), [])?;
        }
    }

    let mut statement = tx.prepare(&schema.insert_sql(target))?;
    let mut inserted = 0usize;
    for row in &table.rows {
        let values = row.values();
        statement.execute(params_from_iter(values.iter()))?;
        inserted += 1;
    }
    Ok(inserted)
}
