//! Schema-bounded, verified appends.
//!
//! Every append follows the same discipline: force the row to the exact
//! schema width, purge any out-of-schema garbage the sheet has accumulated
//! *before* computing the next free row, write the block as one ranged
//! update, then read back the first cell to verify the write landed.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

use taxpipe_core::ValidationResult;

use super::grid::{GridError, GridStore};
use super::schema;

/// Ledger writer configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Sheet holding header rows.
    pub header_sheet: String,
    /// Sheet holding line-item rows.
    pub line_item_sheet: String,
    /// Hard cap on row count. Exceeding it signals ledger exhaustion or
    /// corruption, never a reason to overwrite.
    pub max_rows: usize,
    /// Maximum characters per cell; longer cells are truncated with a
    /// logged warning.
    pub max_cell_chars: usize,
    /// Write headers against the tier-2 (41-column) schema.
    pub extended: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            header_sheet: "Invoices".to_string(),
            line_item_sheet: "Line_Items".to_string(),
            max_rows: 50_000,
            max_cell_chars: 5_000,
            extended: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_header_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.header_sheet = sheet.into();
        self
    }

    pub fn with_line_item_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.line_item_sheet = sheet.into();
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_extended_schema(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }
}

/// Ledger persistence error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed append input (empty row set, empty header row).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The configured row cap would be exceeded.
    #[error("row limit exceeded: {0}")]
    RowLimitExceeded(String),

    /// The read-back after a write did not match what was written. The
    /// caller decides whether to retry; the writer never does.
    #[error("write verification failed: {0}")]
    Verification(String),

    /// The grid backend failed.
    #[error(transparent)]
    Storage(#[from] GridError),
}

/// Receipt for a verified append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    /// 1-indexed row the first written row landed on.
    pub first_row: usize,
    pub rows_written: usize,
    /// First cell of the first written row (the assigned document number
    /// for header appends).
    pub document_number: String,
}

/// Tier-2 fields, resolved against the schema by column name rather than
/// fixed index so the extension set can grow without breaking writers.
#[derive(Debug, Clone, Default)]
pub struct HeaderExtensions {
    pub uploaded_at: Option<DateTime<Utc>>,
    pub uploaded_by: Option<String>,
    pub model_name: Option<String>,
    pub model_version: Option<String>,
    pub processing_ms: Option<u64>,
    pub page_count: Option<usize>,
    pub corrected: Option<bool>,
    pub corrected_fields: Option<Vec<String>>,
    pub correction: Option<JsonValue>,
    pub fingerprint: Option<String>,
    pub duplicate_status: Option<String>,
    pub overall_confidence: Option<f64>,
    pub header_confidence: Option<f64>,
    pub line_confidence: Option<f64>,
    pub low_confidence_fields: Option<Vec<String>>,
    pub needs_review: Option<bool>,
    pub review_notes: Option<String>,
}

impl HeaderExtensions {
    fn apply(&self, cells: &mut [String]) {
        let mut set = |name: &str, value: Option<String>| {
            if let (Some(column), Some(value)) = (schema::extension_column(name), value) {
                if column <= cells.len() {
                    cells[column - 1] = value;
                }
            }
        };

        set("Uploaded_At", self.uploaded_at.map(|t| t.to_rfc3339()));
        set("Uploaded_By", self.uploaded_by.clone());
        set("Model_Name", self.model_name.clone());
        set("Model_Version", self.model_version.clone());
        set("Processing_Ms", self.processing_ms.map(|ms| ms.to_string()));
        set("Page_Count", self.page_count.map(|n| n.to_string()));
        set("Corrected", self.corrected.map(|c| c.to_string()));
        set(
            "Corrected_Fields",
            self.corrected_fields.as_ref().map(|fields| fields.join(",")),
        );
        set(
            "Correction_Json",
            self.correction.as_ref().map(JsonValue::to_string),
        );
        set("Fingerprint", self.fingerprint.clone());
        set("Duplicate_Status", self.duplicate_status.clone());
        set(
            "Overall_Confidence",
            self.overall_confidence.map(|v| format!("{v:.2}")),
        );
        set(
            "Header_Confidence",
            self.header_confidence.map(|v| format!("{v:.2}")),
        );
        set(
            "Line_Confidence",
            self.line_confidence.map(|v| format!("{v:.2}")),
        );
        set(
            "Low_Confidence_Fields",
            self.low_confidence_fields.as_ref().map(|fields| fields.join(",")),
        );
        set("Needs_Review", self.needs_review.map(|n| n.to_string()));
        set("Review_Notes", self.review_notes.clone());
    }
}

/// Force a row to exactly `width` cells: pad with empties, drop the excess,
/// and truncate any cell past the configured character cap.
fn fit_width(row: &[String], width: usize, max_cell_chars: usize) -> Vec<String> {
    let mut cells: Vec<String> = row.iter().take(width).cloned().collect();
    cells.resize(width, String::new());

    for (index, cell) in cells.iter_mut().enumerate() {
        let chars = cell.chars().count();
        if chars > max_cell_chars {
            warn!(
                column = index + 1,
                length = chars,
                cap = max_cell_chars,
                "truncating oversized cell"
            );
            *cell = cell.chars().take(max_cell_chars).collect();
        }
    }

    cells
}

/// Rows that carry data within the schema boundary. Garbage beyond the
/// boundary must already be purged, otherwise stray cells far below the
/// real data would inflate this count.
fn occupied_rows(rows: &[Vec<String>], width: usize) -> usize {
    rows.iter()
        .rposition(|row| row.iter().take(width).any(|cell| !cell.is_empty()))
        .map(|index| index + 1)
        .unwrap_or(0)
}

/// Ledger writer over a narrow grid surface.
///
/// Appends are serialized behind an internal lock for the whole
/// read-purge-compute-write-verify sequence; two writers in the same
/// process cannot race the next-row computation. Concurrent *processes*
/// remain the storage backend's problem.
pub struct LedgerWriter {
    grid: Arc<dyn GridStore>,
    config: LedgerConfig,
    append_lock: Mutex<()>,
}

impl LedgerWriter {
    pub fn new(grid: Arc<dyn GridStore>, config: LedgerConfig) -> Self {
        Self {
            grid,
            config,
            append_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Append one header row against the configured header schema.
    pub fn append_header(
        &self,
        row: &[String],
        validation: &ValidationResult,
    ) -> Result<AppendReceipt, LedgerError> {
        self.append_header_inner(row, validation, None)
    }

    /// Append one header row against the tier-2 schema, resolving the
    /// extension fields by column name.
    pub fn append_header_extended(
        &self,
        row: &[String],
        validation: &ValidationResult,
        extensions: &HeaderExtensions,
    ) -> Result<AppendReceipt, LedgerError> {
        self.append_header_inner(row, validation, Some(extensions))
    }

    fn append_header_inner(
        &self,
        row: &[String],
        validation: &ValidationResult,
        extensions: Option<&HeaderExtensions>,
    ) -> Result<AppendReceipt, LedgerError> {
        if row.is_empty() {
            return Err(LedgerError::InvalidInput("header row is empty".to_string()));
        }

        let width = if extensions.is_some() || self.config.extended {
            schema::EXTENDED_WIDTH
        } else {
            schema::HEADER_WIDTH
        };

        // Computed validation columns live at fixed schema positions.
        let mut cells = row.to_vec();
        if cells.len() < schema::HEADER_WIDTH {
            cells.resize(schema::HEADER_WIDTH, String::new());
        }
        cells[schema::VALIDATION_STATUS_COLUMN - 1] = validation.status.to_string();
        cells[schema::VALIDATION_REMARKS_COLUMN - 1] = validation.summary();

        let mut cells = fit_width(&cells, width, self.config.max_cell_chars);
        if let Some(extensions) = extensions {
            extensions.apply(&mut cells);
        }

        self.append_rows(&self.config.header_sheet, &[cells], width)
    }

    /// Append all line-item rows of one invoice as a single contiguous
    /// block.
    pub fn append_line_items(
        &self,
        rows: &[Vec<String>],
    ) -> Result<AppendReceipt, LedgerError> {
        if rows.is_empty() {
            return Err(LedgerError::InvalidInput(
                "line item row set is empty".to_string(),
            ));
        }

        let fitted: Vec<Vec<String>> = rows
            .iter()
            .map(|row| fit_width(row, schema::LINE_ITEM_WIDTH, self.config.max_cell_chars))
            .collect();

        self.append_rows(
            &self.config.line_item_sheet,
            &fitted,
            schema::LINE_ITEM_WIDTH,
        )
    }

    fn append_rows(
        &self,
        sheet: &str,
        rows: &[Vec<String>],
        width: usize,
    ) -> Result<AppendReceipt, LedgerError> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| GridError::Backend("append lock poisoned".to_string()))?;

        let existing = self.grid.read_all(sheet)?;
        self.purge_overflow(sheet, &existing, width)?;

        let first_row = (occupied_rows(&existing, width) + 1).max(2);
        let last_row = first_row + rows.len() - 1;
        if last_row > self.config.max_rows {
            return Err(LedgerError::RowLimitExceeded(format!(
                "append would reach row {last_row}, configured maximum is {}",
                self.config.max_rows
            )));
        }

        // One ranged update for the whole block; no per-cell writes that
        // could leave a partial row behind a failure.
        let range = schema::range_ref(1, first_row, width, last_row);
        self.grid.write_range(sheet, &range, rows)?;

        let expected = rows[0][0].clone();
        let written = self.grid.read_cell(sheet, &schema::cell_ref(1, first_row))?;
        if written != expected {
            return Err(LedgerError::Verification(format!(
                "sheet {sheet} row {first_row}: wrote {expected:?}, read back {written:?}"
            )));
        }

        debug!(sheet, first_row, rows = rows.len(), "append verified");
        Ok(AppendReceipt {
            first_row,
            rows_written: rows.len(),
            document_number: expected,
        })
    }

    /// Clear any data beyond the schema boundary. Must run before the next
    /// free row is computed: stray cells below the real data would
    /// otherwise inflate the row count.
    fn purge_overflow(
        &self,
        sheet: &str,
        rows: &[Vec<String>],
        width: usize,
    ) -> Result<(), GridError> {
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        if widest <= width {
            return Ok(());
        }

        warn!(
            sheet,
            boundary = width,
            widest,
            "purging out-of-schema data before append"
        );
        let range = schema::range_ref(width + 1, 1, widest, rows.len());
        self.grid.clear_range(sheet, &range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryGrid;
    use taxpipe_core::ValidationStatus;

    fn writer() -> (Arc<InMemoryGrid>, LedgerWriter) {
        let grid = Arc::new(InMemoryGrid::new());
        let writer = LedgerWriter::new(grid.clone(), LedgerConfig::default());
        (grid, writer)
    }

    fn row_of(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn rejects_empty_header_row() {
        let (_, writer) = writer();
        let err = writer
            .append_header(&[], &ValidationResult::passed())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_line_item_set() {
        let (_, writer) = writer();
        let err = writer.append_line_items(&[]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn pads_short_header_row_to_schema_width() {
        let (grid, writer) = writer();
        let receipt = writer
            .append_header(&row_of(&["INV-1", "15/01/2024"]), &ValidationResult::passed())
            .unwrap();

        assert_eq!(receipt.first_row, 2);
        let rows = grid.read_all("Invoices").unwrap();
        // Remarks in column 24 are always non-empty, so the read-back row
        // shows the full schema width.
        assert_eq!(rows[1].len(), schema::HEADER_WIDTH);
        assert_eq!(rows[1][0], "INV-1");
        assert_eq!(rows[1][schema::VALIDATION_STATUS_COLUMN - 1], "OK");
    }

    #[test]
    fn truncates_long_header_row_to_schema_width() {
        let (grid, writer) = writer();
        let long: Vec<String> = (0..30).map(|i| format!("cell-{i}")).collect();
        writer
            .append_header(&long, &ValidationResult::passed())
            .unwrap();

        let rows = grid.read_all("Invoices").unwrap();
        assert_eq!(rows[1].len(), schema::HEADER_WIDTH);
        assert_eq!(grid.read_cell("Invoices", "Y2").unwrap(), "");
    }

    #[test]
    fn injects_validation_columns_at_fixed_positions() {
        let (grid, writer) = writer();
        let result = ValidationResult::from_messages(
            vec!["taxable mismatch".to_string()],
            vec![],
        );
        writer.append_header(&row_of(&["INV-1"]), &result).unwrap();

        assert_eq!(grid.read_cell("Invoices", "W2").unwrap(), "ERROR");
        assert!(grid
            .read_cell("Invoices", "X2")
            .unwrap()
            .contains("taxable mismatch"));
    }

    #[test]
    fn first_append_preserves_a_header_row() {
        let (_, writer) = writer();
        let receipt = writer
            .append_header(&row_of(&["INV-1"]), &ValidationResult::passed())
            .unwrap();
        assert_eq!(receipt.first_row, 2);
    }

    #[test]
    fn purge_precedes_row_index_computation() {
        let (grid, writer) = writer();
        // Real data in rows 1-3, stray garbage at row 8 beyond the schema.
        grid.write_range("Invoices", "A1:A3", &[
            vec!["Invoice_Number".to_string()],
            vec!["INV-1".to_string()],
            vec!["INV-2".to_string()],
        ])
        .unwrap();
        grid.write_range("Invoices", "AB8:AB8", &[vec!["garbage".to_string()]])
            .unwrap();

        let receipt = writer
            .append_header(&row_of(&["INV-3"]), &ValidationResult::passed())
            .unwrap();

        assert_eq!(receipt.first_row, 4);
        assert_eq!(grid.read_cell("Invoices", "AB8").unwrap(), "");
    }

    #[test]
    fn row_cap_is_a_fatal_input_fault() {
        let grid = Arc::new(InMemoryGrid::new());
        let writer = LedgerWriter::new(grid.clone(), LedgerConfig::default().with_max_rows(4));
        for row in 1..=4 {
            grid.write_range(
                "Invoices",
                &format!("A{row}:A{row}"),
                &[vec![format!("INV-{row}")]],
            )
            .unwrap();
        }

        let err = writer
            .append_header(&row_of(&["INV-5"]), &ValidationResult::passed())
            .unwrap_err();
        assert!(matches!(err, LedgerError::RowLimitExceeded(_)));
    }

    #[test]
    fn oversized_cells_are_truncated() {
        let grid = Arc::new(InMemoryGrid::new());
        let writer = LedgerWriter::new(grid.clone(), LedgerConfig::default());
        let oversized = "x".repeat(6_000);
        writer
            .append_header(&row_of(&["INV-1", &oversized]), &ValidationResult::passed())
            .unwrap();

        let stored = grid.read_cell("Invoices", "B2").unwrap();
        assert_eq!(stored.chars().count(), 5_000);
    }

    #[test]
    fn verification_mismatch_is_an_error() {
        struct LyingGrid {
            inner: InMemoryGrid,
        }

        impl GridStore for LyingGrid {
            fn read_all(&self, sheet: &str) -> Result<Vec<Vec<String>>, GridError> {
                self.inner.read_all(sheet)
            }
            fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>, GridError> {
                self.inner.read_column(sheet, column)
            }
            fn write_range(
                &self,
                sheet: &str,
                range: &str,
                rows: &[Vec<String>],
            ) -> Result<(), GridError> {
                self.inner.write_range(sheet, range, rows)
            }
            fn clear_range(&self, sheet: &str, range: &str) -> Result<(), GridError> {
                self.inner.clear_range(sheet, range)
            }
            fn read_cell(&self, _sheet: &str, _cell: &str) -> Result<String, GridError> {
                Ok("tampered".to_string())
            }
        }

        let writer = LedgerWriter::new(
            Arc::new(LyingGrid {
                inner: InMemoryGrid::new(),
            }),
            LedgerConfig::default(),
        );
        let err = writer
            .append_header(&row_of(&["INV-1"]), &ValidationResult::passed())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Verification(_)));
    }

    #[test]
    fn extended_append_resolves_fields_by_name() {
        let grid = Arc::new(InMemoryGrid::new());
        let writer = LedgerWriter::new(
            grid.clone(),
            LedgerConfig::default().with_extended_schema(true),
        );

        let extensions = HeaderExtensions {
            fingerprint: Some("a1b2c3d4e5f60718".to_string()),
            duplicate_status: Some("UNIQUE".to_string()),
            page_count: Some(3),
            ..HeaderExtensions::default()
        };
        writer
            .append_header_extended(
                &row_of(&["INV-1"]),
                &ValidationResult::passed(),
                &extensions,
            )
            .unwrap();

        // Fingerprint is column 34 = AH; the boundary is AO (41).
        assert_eq!(grid.read_cell("Invoices", "AH2").unwrap(), "a1b2c3d4e5f60718");
        assert_eq!(grid.read_cell("Invoices", "AI2").unwrap(), "UNIQUE");
        assert_eq!(grid.read_cell("Invoices", "AD2").unwrap(), "3");
        assert_eq!(schema::column_letter(schema::EXTENDED_WIDTH), "AO");
    }

    #[test]
    fn line_items_append_as_one_contiguous_block() {
        let (grid, writer) = writer();
        let rows = vec![
            row_of(&["INV-1", "15/01/2024", "1"]),
            row_of(&["INV-1", "15/01/2024", "2"]),
        ];
        let receipt = writer.append_line_items(&rows).unwrap();

        assert_eq!(receipt.first_row, 2);
        assert_eq!(receipt.rows_written, 2);
        assert_eq!(grid.read_cell("Line_Items", "C2").unwrap(), "1");
        assert_eq!(grid.read_cell("Line_Items", "C3").unwrap(), "2");
    }

    #[test]
    fn validation_status_survives_round_trip() {
        let (grid, writer) = writer();
        let result = ValidationResult::from_messages(vec![], vec!["rounding".to_string()]);
        assert_eq!(result.status, ValidationStatus::Warning);
        writer.append_header(&row_of(&["INV-1"]), &result).unwrap();
        assert_eq!(grid.read_cell("Invoices", "W2").unwrap(), "WARNING");
    }
}
