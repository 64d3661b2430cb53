//! Relational schema inference for cleaned tables.
//!
//! A [`SchemaDescriptor`] is derived fresh for every load from the kinds and
//! observed values of a table's columns. Column names play no part in the
//! decision: integers become `INTEGER` unless a value's magnitude exceeds the
//! 32-bit signed range, floats become `FLOAT`, timestamps `TIMESTAMP`, and
//! everything else `TEXT`.

use std::fmt;

use serde::Serialize;

use crate::{
    data::Value,
    database::quote_identifier,
    record::{CleanTable, Column, ColumnKind},
};

const INTEGER_MAX_MAGNITUDE: u64 = i32::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SqlType {
    Integer,
    BigInt,
    Float,
    Timestamp,
    Text,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Float => "FLOAT",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Text => "TEXT",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    pub columns: Vec<ColumnSpec>,
}

impl SchemaDescriptor {
    pub fn column_type(&self, name: &str) -> Option<SqlType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.sql_type)
    }

    pub fn create_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE {} ({})",
            quote_identifier(table),
            self.column_definitions()
        )
    }

    pub fn create_table_if_missing_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(table),
            self.column_definitions()
        )
    }

    fn column_definitions(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.sql_type))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn insert_sql(&self, table: &str) -> String {
        let names = self
            .columns
            .iter()
            .map(|c| quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            quote_identifier(table)
        )
    }
}

pub fn infer_schema(table: &CleanTable) -> SchemaDescriptor {
    infer_from_columns(&table.columns())
}

pub fn infer_from_columns(columns: &[Column]) -> SchemaDescriptor {
    SchemaDescriptor {
        columns: columns
            .iter()
            .map(|column| ColumnSpec {
                name: column.name.to_string(),
                sql_type: infer_column_type(column),
            })
            .collect(),
    }
}

pub fn infer_column_type(column: &Column) -> SqlType {
    match column.kind {
        ColumnKind::Integer => {
            let widest = column
                .values
                .iter()
                .filter_map(|value| match value {
                    Some(Value::Integer(i)) => Some(i.unsigned_abs()),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            if widest > INTEGER_MAX_MAGNITUDE {
                SqlType::BigInt
            } else {
                SqlType::Integer
            }
        }
        ColumnKind::Float => SqlType::Float,
        ColumnKind::Timestamp => SqlType::Timestamp,
        ColumnKind::Text => SqlType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integers(values: &[Option<i64>]) -> Column {
        Column {
            name: "anything",
            kind: ColumnKind::Integer,
            values: values.iter().map(|v| v.map(Value::Integer)).collect(),
        }
    }

    #[test]
    fn integer_width_depends_on_observed_magnitude() {
        assert_eq!(
            infer_column_type(&integers(&[Some(500), None, Some(-12)])),
            SqlType::Integer
        );
        assert_eq!(
            infer_column_type(&integers(&[Some(1), Some(3_000_000_000)])),
            SqlType::BigInt
        );
        assert_eq!(
            infer_column_type(&integers(&[Some(-3_000_000_000)])),
            SqlType::BigInt
        );
    }

    #[test]
    fn boundary_value_stays_integer() {
        assert_eq!(
            infer_column_type(&integers(&[Some(2_147_483_647)])),
            SqlType::Integer
        );
        assert_eq!(
            infer_column_type(&integers(&[Some(2_147_483_648)])),
            SqlType::BigInt
        );
        assert_eq!(infer_column_type(&integers(&[Some(i64::MIN)])), SqlType::BigInt);
    }

    #[test]
    fn empty_integer_column_is_integer() {
        assert_eq!(infer_column_type(&integers(&[])), SqlType::Integer);
    }

    #[test]
    fn non_integer_kinds_map_directly() {
        let column = |kind| Column {
            name: "quantity",
            kind,
            values: Vec::new(),
        };
        assert_eq!(infer_column_type(&column(ColumnKind::Float)), SqlType::Float);
        assert_eq!(
            infer_column_type(&column(ColumnKind::Timestamp)),
            SqlType::Timestamp
        );
        assert_eq!(infer_column_type(&column(ColumnKind::Text)), SqlType::Text);
    }

    #[test]
    fn ddl_quotes_identifiers_in_column_order() {
        let schema = SchemaDescriptor {
            columns: vec![
                ColumnSpec {
                    name: "id".into(),
                    sql_type: SqlType::Text,
                },
                ColumnSpec {
                    name: "qty".into(),
                    sql_type: SqlType::BigInt,
                },
            ],
        };
        assert_eq!(
            schema.create_table_sql("sales_data"),
            r#"CREATE TABLE "sales_data" ("id" TEXT, "qty" BIGINT)"#
        );
        assert_eq!(
            schema.insert_sql("sales_data"),
            r#"INSERT INTO "sales_data" ("id", "qty") VALUES (?1, ?2)"#
        );
    }
}
