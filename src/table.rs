use std::borrow::Cow;
use std::fmt::Write as _;

use crate::record::RawTable;

const NULL_MARKER: &str = "NULL";

/// Renders up to `limit` rows as space-aligned columns; absent cells print as `NULL`.
pub fn render_table(table: &RawTable, limit: usize) -> String {
    let rows = table
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            row.iter()
                .map(|cell| sanitize_cell(cell.as_deref().unwrap_or(NULL_MARKER)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = table
        .headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let headers = table
        .headers
        .iter()
        .map(|h| Cow::Borrowed(h.as_str()))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&headers, &widths));
    let separators = widths
        .iter()
        .map(|w| Cow::Owned("-".repeat(*w)))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separators, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(table: &RawTable, limit: usize) {
    print!("{}", render_table(table, limit));
}

fn format_row(values: &[Cow<'_, str>], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
