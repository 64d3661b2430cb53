//! Raw and cleaned table representations.
//!
//! A [`RawTable`] holds cells exactly as read from the export: `Some(text)` or
//! absent. A [`CleanTable`] holds fixed, typed [`CleanRecord`] rows; its
//! [`CleanTable::columns`] view exposes the same data column by column for
//! schema inference and loading.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::{Value, format_timestamp};

pub const TRANSACTION_ID: &str = "transaction_id";
pub const TRANSACTION_DATE: &str = "transaction_date";
pub const ITEM: &str = "item";
pub const QUANTITY: &str = "quantity";
pub const TOTAL_SPENT: &str = "total_spent";
pub const PRICE_PER_UNIT: &str = "price_per_unit";
pub const LOCATION: &str = "location";
pub const PAYMENT_METHOD: &str = "payment_method";
pub const DAY_OF_WEEK: &str = "day_of_week";

/// Output column order of every cleaned table and of the destination relation.
pub const CANONICAL_COLUMNS: [&str; 9] = [
    TRANSACTION_ID,
    TRANSACTION_DATE,
    ITEM,
    QUANTITY,
    TOTAL_SPENT,
    PRICE_PER_UNIT,
    LOCATION,
    PAYMENT_METHOD,
    DAY_OF_WEEK,
];

pub type RawCell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub transaction_id: String,
    pub transaction_date: NaiveDateTime,
    pub item: String,
    pub quantity: Option<i64>,
    pub total_spent: Option<f64>,
    pub price_per_unit: Option<f64>,
    pub location: Option<String>,
    pub payment_method: Option<String>,
    pub day_of_week: String,
}

impl CleanRecord {
    /// Cells in [`CANONICAL_COLUMNS`] order.
    pub fn values(&self) -> [Option<Value>; 9] {
        [
            Some(Value::Text(self.transaction_id.clone())),
            Some(Value::Timestamp(self.transaction_date)),
            Some(Value::Text(self.item.clone())),
            self.quantity.map(Value::Integer),
            self.total_spent.map(Value::Float),
            self.price_per_unit.map(Value::Float),
            self.location.clone().map(Value::Text),
            self.payment_method.clone().map(Value::Text),
            Some(Value::Text(self.day_of_week.clone())),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Integer,
    Float,
    Timestamp,
    Text,
}

/// Declared kind of each canonical column, aligned with [`CANONICAL_COLUMNS`].
pub const CANONICAL_KINDS: [ColumnKind; 9] = [
    ColumnKind::Text,
    ColumnKind::Timestamp,
    ColumnKind::Text,
    ColumnKind::Integer,
    ColumnKind::Float,
    ColumnKind::Float,
    ColumnKind::Text,
    ColumnKind::Text,
    ColumnKind::Text,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub values: Vec<Option<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanTable {
    pub rows: Vec<CleanRecord>,
}

impl CleanTable {
    pub fn new(rows: Vec<CleanRecord>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<Column> {
        let mut columns = CANONICAL_COLUMNS
            .iter()
            .zip(CANONICAL_KINDS)
            .map(|(&name, kind)| Column {
                name,
                kind,
                values: Vec::with_capacity(self.rows.len()),
            })
            .collect::<Vec<_>>();
        for row in &self.rows {
            for (column, value) in columns.iter_mut().zip(row.values()) {
                column.values.push(value);
            }
        }
        columns
    }

    /// Renders every cell back to text so the table can be re-read or exported.
    pub fn to_raw(&self) -> RawTable {
        let headers = CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.values()
                    .into_iter()
                    .map(|value| value.map(|v| render_raw(&v)))
                    .collect()
            })
            .collect();
        RawTable { headers, rows }
    }
}

fn render_raw(value: &Value) -> String {
    match value {
        Value::Timestamp(ts) => format_timestamp(ts),
        // Debug keeps the decimal point so floats re-read as floats.
        Value::Float(f) => format!("{f:?}"),
        other => other.as_display(),
    }
}
