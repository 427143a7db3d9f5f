//! Ledger-backed duplicate lookup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use taxpipe_ledger::{schema, GridError, GridStore, LedgerConfig};

use super::fingerprint::Fingerprint;

/// Ledger row a duplicate resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    /// 1-indexed ledger row of the earlier submission.
    pub row: usize,
    pub document_number: String,
    pub invoice_date: String,
}

/// Outcome of a duplicate probe. Both branches are expected results, not
/// errors; only genuine storage failures use the error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateCheck {
    Fresh,
    Duplicate(DuplicateRecord),
}

/// Scans the ledger's fingerprint column for previously stored keys.
///
/// Legacy ledgers narrower than the tier-2 schema have no fingerprint
/// column; against those every probe reports `Fresh` rather than erroring,
/// so duplicate detection degrades gracefully and never blocks ingestion.
pub struct DuplicateDetector {
    grid: Arc<dyn GridStore>,
    sheet: String,
}

impl DuplicateDetector {
    pub fn new(grid: Arc<dyn GridStore>, config: &LedgerConfig) -> Self {
        Self {
            grid,
            sheet: config.header_sheet.clone(),
        }
    }

    /// Probe the ledger for a previously stored fingerprint.
    pub fn check(&self, fingerprint: &Fingerprint) -> Result<DuplicateCheck, GridError> {
        let column = self.grid.read_column(&self.sheet, schema::FINGERPRINT_COLUMN)?;

        for (index, stored) in column.iter().enumerate() {
            let row = index + 1;
            if row == 1 {
                // Column captions live in row 1.
                continue;
            }
            if !stored.is_empty() && stored == fingerprint.as_str() {
                let document_number =
                    self.grid.read_cell(&self.sheet, &schema::cell_ref(1, row))?;
                let invoice_date =
                    self.grid.read_cell(&self.sheet, &schema::cell_ref(2, row))?;
                debug!(%fingerprint, row, "fingerprint already present");
                return Ok(DuplicateCheck::Duplicate(DuplicateRecord {
                    row,
                    document_number,
                    invoice_date,
                }));
            }
        }

        Ok(DuplicateCheck::Fresh)
    }
}
