//! Error taxonomy for the extract, clean and load stages.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = EtlError> = std::result::Result<T, E>;

/// Errors raised by the pipeline stages. No stage recovers from these locally.
#[derive(Debug, Error)]
pub enum EtlError {
    // === Extract ===
    /// Input file does not exist.
    #[error("input file not found: {path}")]
    NotFound { path: PathBuf },

    /// Input could not be read as a delimited document.
    #[error("failed to parse delimited input {path}: {message}")]
    Parse { path: PathBuf, message: String },

    // === Clean ===
    /// A canonical column is absent after header normalization.
    #[error("required column '{column}' not found in input header")]
    MissingColumn { column: String },

    /// A value survived null reconciliation but cannot be cast.
    #[error("cannot coerce value '{value}' in column '{column}' to {expected}")]
    Coercion {
        column: String,
        value: String,
        expected: &'static str,
    },

    /// A cleaned row read back from disk breaks the cleaned-table rules.
    #[error("cleaned row {row} is invalid: {reason}")]
    InvalidRecord { row: usize, reason: String },

    /// Cleaning produced no rows; refused before reaching the loader.
    #[error("cleaned table is empty, nothing to load")]
    EmptyTable,

    // === Load ===
    /// Destination store rejected the load; the transaction was rolled back.
    #[error("failed to load into table '{table}': {source}")]
    Load {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Destination name cannot be used as an identifier.
    #[error("invalid table name '{name}'")]
    InvalidTableName { name: String },

    /// Connection or query failure outside of a load.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Consumers ===
    /// Loaded table failed a data quality check.
    #[error("validation failed for '{table}': {reason}")]
    Validation { table: String, reason: String },

    /// A report query could not be executed or written.
    #[error("report '{name}' failed: {message}")]
    Report { name: String, message: String },

    /// Configuration file could not be read or is invalid.
    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl EtlError {
    pub(crate) fn load(table: &str, source: rusqlite::Error) -> Self {
        EtlError::Load {
            table: table.to_string(),
            source,
        }
    }
}
