//! External collaborator contracts.
//!
//! The recognition service, the parser and the auxiliary side-effect sinks
//! are out of scope for this repository; the processor depends only on
//! these narrow traits. Best-effort collaborators report faults through
//! `anyhow` and the processor swallows and logs them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taxpipe_core::{InvoiceHeader, LineItem, ValidationResult};
use taxpipe_dedup::{DuplicateRecord, Fingerprint};

/// Per-page metadata reported by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub index: usize,
    pub source: PathBuf,
    pub characters: usize,
}

/// Recognition output for one invoice image set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
    pub pages: Vec<PageMetadata>,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parsing failed: {0}")]
    Failed(String),
}

/// Parsed invoice: header, ordered line items and the validation result the
/// parser obtained from the rule engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInvoice {
    pub header: InvoiceHeader,
    pub line_items: Vec<LineItem>,
    pub validation: ValidationResult,
}

/// Turns scanned images into OCR text.
pub trait TextExtraction: Send + Sync {
    fn extract(&self, image_paths: &[PathBuf]) -> Result<Extraction, ExtractionError>;
}

/// Turns OCR text into a structured invoice.
///
/// Implementations are expected to run the validation engine internally and
/// surface its result unchanged.
pub trait InvoiceParsing: Send + Sync {
    fn parse_with_validation(&self, text: &str) -> Result<ParsedInvoice, ParseError>;
}

/// Best-effort sink for rejected duplicate submissions.
pub trait AuditLog: Send + Sync {
    fn record_duplicate_attempt(
        &self,
        fingerprint: &Fingerprint,
        attempted: &InvoiceHeader,
        existing: &DuplicateRecord,
    ) -> anyhow::Result<()>;
}

/// Best-effort registry of counterparties and item classifications seen
/// during ingestion.
pub trait CatalogStore: Send + Sync {
    fn upsert_party(&self, tax_id: &str, name: &str) -> anyhow::Result<()>;
    fn upsert_hsn(&self, code: &str, description: &str) -> anyhow::Result<()>;
}
