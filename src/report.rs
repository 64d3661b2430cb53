//! Runs read-only SQL report files against the loaded table and writes each
//! result set to a CSV file named after the query.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use rusqlite::{Connection, types::ValueRef};

use crate::error::{EtlError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutput {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Executes every `*.sql` file in `sql_dir`, in file-name order.
pub fn run_reports(
    conn: &Connection,
    sql_dir: &Path,
    reports_dir: &Path,
) -> Result<Vec<ReportOutput>> {
    let queries = list_queries(sql_dir)?;
    fs::create_dir_all(reports_dir)
        .map_err(|err| report_error(&reports_dir.display().to_string(), err))?;

    let mut outputs = Vec::with_capacity(queries.len());
    for query_path in queries {
        let name = query_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sql = fs::read_to_string(&query_path).map_err(|err| report_error(&name, err))?;
        if sql.trim().is_empty() {
            warn!("Skipping empty report query {:?}", query_path);
            continue;
        }
        let path = reports_dir.join(format!("{name}.csv"));
        let rows = run_report(conn, &name, &sql, &path)?;
        info!("Report saved: {:?} ({} row(s))", path, rows);
        outputs.push(ReportOutput { name, path, rows });
    }
    Ok(outputs)
}

pub fn run_report(conn: &Connection, name: &str, sql: &str, output: &Path) -> Result<usize> {
    let mut statement = conn.prepare(sql).map_err(|err| report_error(name, err))?;
    if !statement.readonly() {
        return Err(EtlError::Report {
            name: name.to_string(),
            message: "report queries must be read-only".to_string(),
        });
    }
    let headers = statement
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let column_count = headers.len();

    let mut writer = csv::Writer::from_path(output).map_err(|err| report_error(name, err))?;
    writer
        .write_record(&headers)
        .map_err(|err| report_error(name, err))?;

    let mut rows = statement.query([]).map_err(|err| report_error(name, err))?;
    let mut written = 0usize;
    while let Some(row) = rows.next().map_err(|err| report_error(name, err))? {
        let record = (0..column_count)
            .map(|idx| row.get_ref(idx).map(render_cell))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|err| report_error(name, err))?;
        writer
            .write_record(&record)
            .map_err(|err| report_error(name, err))?;
        written += 1;
    }
    writer.flush().map_err(|err| report_error(name, err))?;
    Ok(written)
}

fn list_queries(sql_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_name = sql_dir.display().to_string();
    let mut queries = fs::read_dir(sql_dir)
        .map_err(|err| report_error(&dir_name, err))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|err| report_error(&dir_name, err))?
        .into_iter()
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
        })
        .collect::<Vec<_>>();
    queries.sort();
    Ok(queries)
}

fn render_cell(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

fn report_error(name: &str, err: impl std::fmt::Display) -> EtlError {
    EtlError::Report {
        name: name.to_string(),
        message: err.to_string(),
    }
}
