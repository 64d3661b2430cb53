use std::{fs, io, path::Path};

use log::{debug, info};

use crate::{
    error::{EtlError, Result},
    io_utils,
    record::RawTable,
};

/// Reads a delimited file with a header row into a [`RawTable`].
///
/// Values are kept as text; empty fields become absent cells. No other
/// interpretation happens here.
pub fn extract(path: &Path, delimiter: u8) -> Result<RawTable> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => EtlError::NotFound {
            path: path.to_path_buf(),
        },
        _ => parse_error(path, err),
    })?;
    info!(
        "Extracting '{}' with delimiter '{}'",
        path.display(),
        io_utils::printable_delimiter(delimiter)
    );
    if let Some(offset) = io_utils::unterminated_quote(&bytes, delimiter) {
        return Err(EtlError::Parse {
            path: path.to_path_buf(),
            message: format!("unterminated quoted field starting at byte {offset}"),
        });
    }
    let mut reader = io_utils::open_csv_reader(bytes.as_slice(), delimiter);
    let headers = reader
        .headers()
        .map_err(|err| parse_error(path, err))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    debug!("Raw headers: {:?}", headers);

    let mut table = RawTable::new(headers);
    for record in reader.records() {
        let record = record.map_err(|err| parse_error(path, err))?;
        let row = record
            .iter()
            .map(|field| (!field.is_empty()).then(|| field.to_string()))
            .collect();
        table.rows.push(row);
    }
    info!(
        "Extracted {} row(s) across {} column(s)",
        table.row_count(),
        table.headers.len()
    );
    Ok(table)
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> EtlError {
    EtlError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
