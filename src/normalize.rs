//! Row normalization against a field schema.
//!
//! Turns one raw [`Row`] into exactly `schema.len()` clean strings:
//!
//! 1. Rows with more raw cells than the input header are rejected with
//!    [`RowError::TooManyValues`]. The caller logs and skips them.
//! 2. Each raw cell loses one pair of wrapping quotes, but only when both
//!    ends carry the same quote character ([`strip_wrapping_quotes`]).
//! 3. Line breaks, literal or escaped, become [`LINE_BREAK`] because card
//!    markup does not render raw newlines.
//! 4. Missing trailing positions are padded with `""`, then values filled
//!    by enrichment are placed at their schema positions.

use crate::schema::FieldSchema;
use crate::types::Row;
use thiserror::Error;

/// Marker substituted for every line break in a cell.
pub const LINE_BREAK: &str = "<br>";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("Row on line {line} has {found} values but the header declares {expected}")]
    TooManyValues {
        line: usize,
        found: usize,
        expected: usize,
    },
}

/// Normalize `row` against `schema`.
pub fn normalize(row: &Row, schema: &FieldSchema) -> Result<Vec<String>, RowError> {
    if row.cells.len() > schema.input_width() {
        return Err(RowError::TooManyValues {
            line: row.line,
            found: row.cells.len(),
            expected: schema.input_width(),
        });
    }

    let mut values: Vec<String> = row.cells.iter().map(|cell| clean_cell(cell)).collect();
    values.resize(schema.len(), String::new());
    for (&index, value) in &row.filled {
        if let Some(slot) = values.get_mut(index) {
            *slot = value.clone();
        }
    }
    Ok(values)
}

/// Quote stripping followed by line-break normalization.
pub fn clean_cell(cell: &str) -> String {
    normalize_line_breaks(strip_wrapping_quotes(cell))
}

/// Remove one leading and one trailing quote when both ends match.
///
/// `"easy; simple"` becomes `easy; simple`, `easy, "simple"` is left alone,
/// and `"easy; "simple""` keeps its inner quotes: `easy; "simple"`.
pub fn strip_wrapping_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Replace literal and escaped line breaks with [`LINE_BREAK`].
pub fn normalize_line_breaks(value: &str) -> String {
    value
        .replace("\\r\\n", LINE_BREAK)
        .replace("\r\n", LINE_BREAK)
        .replace("\\n", LINE_BREAK)
        .replace(['\n', '\r'], LINE_BREAK)
}
