//! Reader/writer construction and delimiter resolution for delimited files.
//!
//! - **Delimiter resolution**: extension-based detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Readers** are strict: ragged rows are rejected rather than padded, and
//!   [`unterminated_quote`] catches a quoted field still open at end of input,
//!   which the `csv` reader otherwise accepts as one long field.
//! - **stdout**: a missing output path or `-` routes through standard output.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

/// Byte offset of the opening quote of a field that is never closed.
///
/// A quote only opens a quoted field at the start of a field; `""` inside a
/// quoted field is an escaped quote.
pub fn unterminated_quote(bytes: &[u8], delimiter: u8) -> Option<usize> {
    let mut open_at = None;
    let mut at_field_start = true;
    let mut idx = 0;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if open_at.is_some() {
            if byte == b'"' {
                if bytes.get(idx + 1) == Some(&b'"') {
                    idx += 1;
                } else {
                    open_at = None;
                }
            }
        } else if byte == b'"' && at_field_start {
            open_at = Some(idx);
            at_field_start = false;
        } else {
            at_field_start = byte == delimiter || byte == b'\n' || byte == b'\r';
        }
        idx += 1;
    }
    open_at
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("sales.tsv"), None),
            b'\t'
        );
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("sales.csv"), None),
            b','
        );
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("sales.tsv"), Some(b';')),
            b';'
        );
    }

    #[test]
    fn unterminated_quote_reports_opening_offset() {
        assert_eq!(unterminated_quote(b"a,b\n1,\"2\n", b','), Some(6));
        assert_eq!(unterminated_quote(b"a,b\n\"x\"\"\n", b','), Some(4));
        assert_eq!(unterminated_quote(b"a,b\n\"1,\n2\",3\n", b','), None);
        assert_eq!(unterminated_quote(b"a,b\n\"say \"\"hi\"\"\",3\n", b','), None);
        // A quote inside an unquoted field is literal text.
        assert_eq!(unterminated_quote(b"a,b\n5\" pizza,3\n", b','), None);
        assert_eq!(unterminated_quote(b"a\tb\n1\t\"2", b'\t'), Some(6));
    }

    #[test]
    fn printable_delimiter_escapes_tab() {
        assert_eq!(printable_delimiter(b'\t'), "\\t");
        assert_eq!(printable_delimiter(b'|'), "|");
    }
}
