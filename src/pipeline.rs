use log::info;
use serde::Serialize;

use crate::{
    clean::clean_with_report,
    config::PipelineConfig,
    database,
    error::{EtlError, Result},
    extract::extract,
    io_utils,
    load::load,
    record::CleanTable,
    validate::{ValidationSummary, validate},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub extracted: usize,
    pub cleaned: usize,
    pub dropped: usize,
    pub loaded: usize,
    pub validation: Option<ValidationSummary>,
}

/// Refuses to hand an empty cleaned table to the loader.
pub fn ensure_loadable(table: &CleanTable) -> Result<()> {
    if table.is_empty() {
        return Err(EtlError::EmptyTable);
    }
    Ok(())
}

/// Extract → clean → load, then the read-only quality checks when `validate_after`.
///
/// Each stage consumes the whole output of the previous one.
pub fn run_pipeline(config: &PipelineConfig, validate_after: bool) -> Result<PipelineSummary> {
    let delimiter = io_utils::resolve_input_delimiter(&config.input, config.delimiter_byte()?);
    let raw = extract(&config.input, delimiter)?;
    let extracted = raw.row_count();

    let outcome = clean_with_report(raw)?;
    ensure_loadable(&outcome.table)?;

    let mut conn = database::open(&config.database)?;
    let loaded = load(&mut conn, &outcome.table, &config.table, config.mode)?;
    let validation = if validate_after {
        Some(validate(&conn, &config.table)?)
    } else {
        None
    };

    let summary = PipelineSummary {
        extracted,
        cleaned: outcome.table.row_count(),
        dropped: outcome.dropped.len(),
        loaded,
        validation,
    };
    info!(
        "Pipeline finished: {} extracted, {} dropped, {} loaded into '{}'",
        summary.extracted, summary.dropped, summary.loaded, config.table
    );
    Ok(summary)
}
