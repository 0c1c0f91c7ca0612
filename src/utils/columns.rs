//! CSV header location and column validation
//!
//! Reference tables ship with one or more decorative rows above the real
//! header. Instead of trusting a fixed row offset, the header is the first
//! line (within a small window) that names every required column. Required
//! columns are then resolved by name with explicit errors.

use crate::error::{DataFormatError, TableKind};
use polars::prelude::*;
use std::io::Cursor;

/// How many leading lines may hold the header row
pub const HEADER_SCAN_LINES: usize = 5;

/// A named column requirement with a case/whitespace-insensitive matcher
#[derive(Clone, Copy)]
pub struct ColumnSpec {
    /// Name reported in errors
    pub label: &'static str,
    matcher: fn(&str) -> bool,
}

impl ColumnSpec {
    pub const fn new(label: &'static str, matcher: fn(&str) -> bool) -> Self {
        Self { label, matcher }
    }

    /// Check a raw header cell against this column
    pub fn matches(&self, header: &str) -> bool {
        (self.matcher)(&normalize_header(header))
    }
}

/// Lowercase and strip all whitespace and quotes: "Avg. soil N (kg/ha)" → "avg.soiln(kg/ha)"
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '"')
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when some cell of `line` satisfies one of `alternatives`
fn line_has_column(line: &str, alternatives: &[ColumnSpec]) -> bool {
    line.split(',')
        .any(|cell| alternatives.iter().any(|spec| spec.matches(cell)))
}

/// Index of the header line
///
/// `required` holds one group of alternatives per required column; the
/// first group is the key column. The header is the first line naming
/// every required column. Failing that, the first line naming the key
/// column is used so the later column lookup reports what is missing.
pub fn locate_header(
    text: &str,
    required: &[&[ColumnSpec]],
    table: TableKind,
) -> Result<usize, DataFormatError> {
    let key = required.first().copied().unwrap_or(&[]);
    let window: Vec<&str> = text.lines().take(HEADER_SCAN_LINES).collect();

    window
        .iter()
        .position(|line| {
            !required.is_empty() && required.iter().all(|group| line_has_column(line, group))
        })
        .or_else(|| window.iter().position(|line| line_has_column(line, key)))
        .ok_or_else(|| DataFormatError::MissingColumn {
            table,
            column: key.first().map_or("", |s| s.label).to_string(),
        })
}

/// Parse a reference table into a string-typed DataFrame
///
/// # Arguments
/// * `text` - Raw CSV text including decorative rows
/// * `required` - Required columns, key column first, each with alternatives
/// * `table` - Table identity for error messages
///
/// # Errors
/// Returns `EmptyData` for blank input, `MissingColumn` if no header row
/// names the key column, `Csv` if polars rejects the body.
pub fn read_table(
    text: &str,
    required: &[&[ColumnSpec]],
    table: TableKind,
) -> Result<DataFrame, DataFormatError> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(DataFormatError::EmptyData { table });
    }

    let header_idx = locate_header(text, required, table)?;
    let body = text.lines().skip(header_idx).collect::<Vec<_>>().join("\n");

    // Schema inference length 0 keeps every column as String; cells like
    // "100-120" are parsed later with row-level errors.
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(body.into_bytes()))
        .finish()
        .map_err(|e| DataFormatError::Csv {
            table,
            message: e.to_string(),
        })
}

/// Name of the first DataFrame column matching any of the given columns, tried in order
///
/// The error names the first label.
pub fn resolve_column(
    df: &DataFrame,
    specs: &[ColumnSpec],
    table: TableKind,
) -> Result<String, DataFormatError> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    specs
        .iter()
        .find_map(|spec| names.iter().find(|name| spec.matches(name)).cloned())
        .ok_or_else(|| DataFormatError::MissingColumn {
            table,
            column: specs.first().map_or("", |s| s.label).to_string(),
        })
}

/// Optional column lookup; `None` when no header matches
pub fn find_column(df: &DataFrame, spec: &ColumnSpec) -> Option<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .find(|name| spec.matches(name))
}

/// Borrow a resolved column as strings
pub fn string_column<'a>(
    df: &'a DataFrame,
    name: &str,
    table: TableKind,
) -> Result<&'a StringChunked, DataFormatError> {
    df.column(name)
        .and_then(|c| c.str())
        .map_err(|e| DataFormatError::Csv {
            table,
            message: format!("column '{}': {}", name, e),
        })
}
