//! In-memory grid backend.
//!
//! Intended for tests and development. Mirrors spreadsheet semantics:
//! sheets appear on first write, reads of missing sheets are empty, and
//! trailing empty cells and rows are trimmed on read.

use std::collections::HashMap;
use std::sync::RwLock;

use super::grid::{parse_cell, parse_range, GridError, GridStore};

#[derive(Debug, Default)]
pub struct InMemoryGrid {
    sheets: RwLock<HashMap<String, Vec<Vec<String>>>>,
}

impl InMemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn trimmed(rows: &[Vec<String>]) -> Vec<Vec<String>> {
        let mut out: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                let width = row
                    .iter()
                    .rposition(|cell| !cell.is_empty())
                    .map(|i| i + 1)
                    .unwrap_or(0);
                row[..width].to_vec()
            })
            .collect();
        let height = out
            .iter()
            .rposition(|row| !row.is_empty())
            .map(|i| i + 1)
            .unwrap_or(0);
        out.truncate(height);
        out
    }
}

impl GridStore for InMemoryGrid {
    fn read_all(&self, sheet: &str) -> Result<Vec<Vec<String>>, GridError> {
        let sheets = self
            .sheets
            .read()
            .map_err(|_| GridError::Backend("lock poisoned".to_string()))?;
        Ok(sheets.get(sheet).map(|rows| Self::trimmed(rows)).unwrap_or_default())
    }

    fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>, GridError> {
        if column == 0 {
            return Err(GridError::MalformedReference("column 0".to_string()));
        }
        let sheets = self
            .sheets
            .read()
            .map_err(|_| GridError::Backend("lock poisoned".to_string()))?;
        let Some(rows) = sheets.get(sheet) else {
            return Ok(Vec::new());
        };
        Ok(Self::trimmed(rows)
            .iter()
            .map(|row| row.get(column - 1).cloned().unwrap_or_default())
            .collect())
    }

    fn write_range(&self, sheet: &str, range: &str, rows: &[Vec<String>]) -> Result<(), GridError> {
        let ((first_column, first_row), (last_column, last_row)) = parse_range(range)?;
        if first_column > last_column || first_row > last_row {
            return Err(GridError::MalformedReference(range.to_string()));
        }

        let height = last_row - first_row + 1;
        let width = last_column - first_column + 1;
        if rows.len() != height || rows.iter().any(|row| row.len() != width) {
            return Err(GridError::ShapeMismatch(format!(
                "range {range} expects {height}x{width} cells"
            )));
        }

        let mut sheets = self
            .sheets
            .write()
            .map_err(|_| GridError::Backend("lock poisoned".to_string()))?;
        let grid = sheets.entry(sheet.to_string()).or_default();

        if grid.len() < last_row {
            grid.resize(last_row, Vec::new());
        }
        for (offset, row) in rows.iter().enumerate() {
            let target = &mut grid[first_row - 1 + offset];
            if target.len() < last_column {
                target.resize(last_column, String::new());
            }
            target[first_column - 1..last_column].clone_from_slice(row);
        }

        Ok(())
    }

    fn clear_range(&self, sheet: &str, range: &str) -> Result<(), GridError> {
        let ((first_column, first_row), (last_column, last_row)) = parse_range(range)?;

        let mut sheets = self
            .sheets
            .write()
            .map_err(|_| GridError::Backend("lock poisoned".to_string()))?;
        let Some(grid) = sheets.get_mut(sheet) else {
            return Ok(());
        };

        for row in grid.iter_mut().skip(first_row - 1).take(last_row - first_row + 1) {
            for cell in row
                .iter_mut()
                .skip(first_column - 1)
                .take(last_column - first_column + 1)
            {
                cell.clear();
            }
        }

        Ok(())
    }

    fn read_cell(&self, sheet: &str, cell: &str) -> Result<String, GridError> {
        let (column, row) = parse_cell(cell)?;
        let sheets = self
            .sheets
            .read()
            .map_err(|_| GridError::Backend("lock poisoned".to_string()))?;
        Ok(sheets
            .get(sheet)
            .and_then(|rows| rows.get(row - 1))
            .and_then(|cells| cells.get(column - 1))
            .cloned()
            .unwrap_or_default())
    }
}
