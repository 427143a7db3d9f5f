//! Narrow grid-storage surface the ledger writer depends on.
//!
//! The backing store is a 1-indexed grid addressed by A1-style references,
//! one named sheet per schema. Keeping this surface small is what makes the
//! validation/dedup/batch core portable: a spreadsheet service and a
//! database-backed table can both sit behind it.

use std::sync::Arc;

use thiserror::Error;

/// Grid storage error.
///
/// These are infrastructure errors. Business findings never travel through
/// this type.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("malformed cell or range reference: {0}")]
    MalformedReference(String),

    #[error("range shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("grid backend error: {0}")]
    Backend(String),
}

/// A 1-indexed, A1-addressed grid of string cells.
///
/// Implementations must treat missing sheets, rows and cells as empty on
/// read; only genuine backend failures are errors.
pub trait GridStore: Send + Sync {
    /// Read every populated row of a sheet. Trailing empty cells and rows
    /// are trimmed, mirroring spreadsheet read semantics, so rows may be
    /// narrower than the schema.
    fn read_all(&self, sheet: &str) -> Result<Vec<Vec<String>>, GridError>;

    /// Read one 1-indexed column top to bottom, empty string for cells the
    /// sheet does not have.
    fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>, GridError>;

    /// Write a rectangular block in a single update. The row block must
    /// match the range shape exactly; implementations reject mismatches
    /// rather than writing a partial block.
    fn write_range(&self, sheet: &str, range: &str, rows: &[Vec<String>]) -> Result<(), GridError>;

    /// Clear every cell in a range.
    fn clear_range(&self, sheet: &str, range: &str) -> Result<(), GridError>;

    /// Read a single cell, empty string if unset.
    fn read_cell(&self, sheet: &str, cell: &str) -> Result<String, GridError>;
}

impl<S> GridStore for Arc<S>
where
    S: GridStore + ?Sized,
{
    fn read_all(&self, sheet: &str) -> Result<Vec<Vec<String>>, GridError> {
        (**self).read_all(sheet)
    }

    fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>, GridError> {
        (**self).read_column(sheet, column)
    }

    fn write_range(&self, sheet: &str, range: &str, rows: &[Vec<String>]) -> Result<(), GridError> {
        (**self).write_range(sheet, range, rows)
    }

    fn clear_range(&self, sheet: &str, range: &str) -> Result<(), GridError> {
        (**self).clear_range(sheet, range)
    }

    fn read_cell(&self, sheet: &str, cell: &str) -> Result<String, GridError> {
        (**self).read_cell(sheet, cell)
    }
}

/// Parse an A1 cell reference into a 1-indexed `(column, row)` pair.
pub fn parse_cell(reference: &str) -> Result<(usize, usize), GridError> {
    let letters: String = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let digits = &reference[letters.len()..];

    if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(GridError::MalformedReference(reference.to_string()));
    }

    let mut column = 0usize;
    for c in letters.chars() {
        column = column * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }

    let row: usize = digits
        .parse()
        .map_err(|_| GridError::MalformedReference(reference.to_string()))?;
    if row == 0 {
        return Err(GridError::MalformedReference(reference.to_string()));
    }

    Ok((column, row))
}

/// Parse an A1 range reference into its corner cells.
pub fn parse_range(range: &str) -> Result<((usize, usize), (usize, usize)), GridError> {
    let (start, end) = range
        .split_once(':')
        .ok_or_else(|| GridError::MalformedReference(range.to_string()))?;
    Ok((parse_cell(start)?, parse_cell(end)?))
}
