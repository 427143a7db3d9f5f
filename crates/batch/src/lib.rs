//! `taxpipe-batch` — sequential batch orchestration with per-item failure
//! isolation.
//!
//! The processor drives each invoice through extraction, parsing, duplicate
//! detection and ledger persistence. Items are strictly sequential; one
//! item's failure - including a panic - never aborts the batch. Isolation
//! is the defining property of this crate.

pub mod collaborators;
pub mod processor;
pub mod report;
pub mod result;

pub use collaborators::{
    AuditLog, CatalogStore, Extraction, ExtractionError, InvoiceParsing, PageMetadata,
    ParsedInvoice, ParseError, TextExtraction,
};
pub use processor::{BatchOptions, BatchProcessor, InvoiceJob};
pub use report::render_report;
pub use result::{BatchId, BatchResult, ItemOutcome, ItemResult, Stage, StatusHistogram};
