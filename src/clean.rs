//! Normalization of a raw sales export into a [`CleanTable`].
//!
//! Steps run in a fixed order, each depending on the previous one:
//!
//! 1. header normalization (`"Transaction ID"` → `transaction_id`)
//! 2. sentinel tokens (`UNKNOWN`, `ERROR`) become absent cells
//! 3. rows missing any required column are dropped, with the reason recorded
//! 4. surviving cells are coerced to their typed fields
//! 5. `day_of_week` is derived from `transaction_date`
//!
//! A coercion failure after step 3 fails the whole call; rows are never
//! silently discarded once they pass the filter.

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    data::{self, coerce_float, coerce_integer, coerce_timestamp},
    error::{EtlError, Result},
    record::{
        CleanRecord, CleanTable, ITEM, LOCATION, PAYMENT_METHOD, PRICE_PER_UNIT, QUANTITY,
        RawCell, RawTable, TOTAL_SPENT, TRANSACTION_DATE, TRANSACTION_ID,
    },
};

/// Input columns the cleaner reads, in lookup order.
const SOURCE_COLUMNS: [&str; 8] = [
    TRANSACTION_ID,
    TRANSACTION_DATE,
    ITEM,
    QUANTITY,
    TOTAL_SPENT,
    PRICE_PER_UNIT,
    LOCATION,
    PAYMENT_METHOD,
];

pub const SENTINEL_COLUMNS: [&str; 7] = [
    TRANSACTION_DATE,
    PAYMENT_METHOD,
    ITEM,
    QUANTITY,
    TOTAL_SPENT,
    PRICE_PER_UNIT,
    LOCATION,
];

pub const REQUIRED_COLUMNS: [&str; 5] = [
    TRANSACTION_ID,
    ITEM,
    QUANTITY,
    TRANSACTION_DATE,
    PRICE_PER_UNIT,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowVerdict {
    Keep,
    Drop { missing: Vec<&'static str> },
}

/// A row removed by the required-column filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRow {
    /// Zero-based position in the raw table.
    pub row: usize,
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub table: CleanTable,
    pub dropped: Vec<DroppedRow>,
}

pub fn clean(raw: RawTable) -> Result<CleanTable> {
    clean_with_report(raw).map(|outcome| outcome.table)
}

pub fn clean_with_report(mut raw: RawTable) -> Result<CleanOutcome> {
    normalize_headers(&mut raw);
    let layout = SourceLayout::resolve(&raw)?;
    reconcile_sentinels(&mut raw, &layout);

    let input_rows = raw.row_count();
    let mut kept = Vec::with_capacity(input_rows);
    let mut dropped = Vec::new();
    for (idx, row) in raw.rows.into_iter().enumerate() {
        match layout.verdict(&row) {
            RowVerdict::Keep => kept.push(row),
            RowVerdict::Drop { missing } => {
                debug!("Dropping row {idx}: missing {missing:?}");
                dropped.push(DroppedRow { row: idx, missing });
            }
        }
    }

    let rows = kept
        .iter()
        .map(|row| layout.coerce(row))
        .collect::<Result<Vec<_>>>()?;
    info!(
        "Cleaned {} of {} row(s); dropped {} with missing required values",
        rows.len(),
        input_rows,
        dropped.len()
    );
    Ok(CleanOutcome {
        table: CleanTable::new(rows),
        dropped,
    })
}

/// Re-checks a cleaned table that did not come straight from [`clean`], such
/// as one read back from JSON.
///
/// Required fields must be present and non-empty and numeric fields finite.
/// `day_of_week` is re-derived from `transaction_date`.
pub fn conform(mut table: CleanTable) -> Result<CleanTable> {
    let mut rederived = 0usize;
    for (idx, record) in table.rows.iter_mut().enumerate() {
        let invalid = |reason: String| EtlError::InvalidRecord { row: idx, reason };
        if record.transaction_id.is_empty() {
            return Err(invalid(format!("{TRANSACTION_ID} is empty")));
        }
        if record.item.is_empty() {
            return Err(invalid(format!("{ITEM} is empty")));
        }
        if record.quantity.is_none() {
            return Err(invalid(format!("{QUANTITY} is null")));
        }
        match record.price_per_unit {
            None => return Err(invalid(format!("{PRICE_PER_UNIT} is null"))),
            Some(price) if !price.is_finite() => {
                return Err(invalid(format!("{PRICE_PER_UNIT} is not finite")));
            }
            Some(_) => {}
        }
        if record.total_spent.is_some_and(|total| !total.is_finite()) {
            return Err(invalid(format!("{TOTAL_SPENT} is not finite")));
        }
        let weekday = data::day_of_week(&record.transaction_date);
        if record.day_of_week != weekday {
            record.day_of_week = weekday;
            rederived += 1;
        }
    }
    if rederived > 0 {
        warn!("Re-derived day_of_week for {rederived} row(s)");
    }
    Ok(table)
}

pub fn normalize_headers(raw: &mut RawTable) {
    for header in &mut raw.headers {
        *header = data::normalize_column_name(header);
    }
}

pub fn reconcile_sentinels(raw: &mut RawTable, layout: &SourceLayout) {
    let indices = SENTINEL_COLUMNS
        .iter()
        .filter_map(|column| layout.index_of(column))
        .collect::<Vec<_>>();
    let mut replaced = 0usize;
    for row in &mut raw.rows {
        for &idx in &indices {
            let Some(cell) = row.get_mut(idx) else {
                continue;
            };
            if cell.as_deref().is_some_and(data::is_sentinel) {
                *cell = None;
                replaced += 1;
            }
        }
    }
    debug!("Replaced {replaced} sentinel value(s) with nulls");
}

/// Positions of the source columns within a header-normalized raw table.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    indices: [usize; SOURCE_COLUMNS.len()],
}

impl SourceLayout {
    pub fn resolve(raw: &RawTable) -> Result<Self> {
        let mut indices = [0usize; SOURCE_COLUMNS.len()];
        for (slot, column) in indices.iter_mut().zip(SOURCE_COLUMNS) {
            *slot = raw
                .column_index(column)
                .ok_or_else(|| EtlError::MissingColumn {
                    column: column.to_string(),
                })?;
        }
        Ok(Self { indices })
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        SOURCE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|position| self.indices[position])
    }

    fn get<'a>(&self, row: &'a [RawCell], column: &str) -> Option<&'a str> {
        self.index_of(column)
            .and_then(|idx| row.get(idx))
            .and_then(|cell| cell.as_deref())
    }

    pub fn verdict(&self, row: &[RawCell]) -> RowVerdict {
        let missing = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| self.get(row, column).is_none())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            RowVerdict::Keep
        } else {
            RowVerdict::Drop { missing }
        }
    }

    fn require<'a>(
        &self,
        row: &'a [RawCell],
        column: &str,
        expected: &'static str,
    ) -> Result<&'a str> {
        self.get(row, column).ok_or_else(|| EtlError::Coercion {
            column: column.to_string(),
            value: "<null>".to_string(),
            expected,
        })
    }

    fn coerce(&self, row: &[RawCell]) -> Result<CleanRecord> {
        let transaction_date = coerce_timestamp(
            TRANSACTION_DATE,
            self.require(row, TRANSACTION_DATE, "timestamp")?,
        )?;
        let optional_float = |column: &'static str| {
            self.get(row, column)
                .map(|value| coerce_float(column, value))
                .transpose()
        };
        Ok(CleanRecord {
            transaction_id: self.require(row, TRANSACTION_ID, "text")?.to_string(),
            day_of_week: data::day_of_week(&transaction_date),
            transaction_date,
            item: self.require(row, ITEM, "text")?.to_string(),
            quantity: Some(coerce_integer(
                QUANTITY,
                self.require(row, QUANTITY, "integer")?,
            )?),
            total_spent: optional_float(TOTAL_SPENT)?,
            price_per_unit: optional_float(PRICE_PER_UNIT)?,
            location: self.get(row, LOCATION).map(str::to_string),
            payment_method: self.get(row, PAYMENT_METHOD).map(str::to_string),
        })
    }
}
