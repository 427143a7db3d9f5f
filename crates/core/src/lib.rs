//! `taxpipe-core` — domain records for the invoice-ingestion pipeline.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! the invoice header and line-item records as they arrive from the parsing
//! collaborator, defensive numeric parsing for the text-typed boundary, and
//! the validation status/result model shared by the rule engine and the
//! ledger writer.

pub mod amount;
pub mod header;
pub mod line_item;
pub mod validation;

pub use amount::{format_amount, parse_amount, parse_optional_amount};
pub use header::{InvoiceHeader, SupplyType};
pub use line_item::LineItem;
pub use validation::{ValidationResult, ValidationStatus};
