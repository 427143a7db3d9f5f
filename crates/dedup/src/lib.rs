//! `taxpipe-dedup` — duplicate detection for ingested invoices.
//!
//! A fingerprint is a stable digest over normalized header identity fields;
//! formatting noise in any of them must not change it. The detector
//! compares a freshly computed fingerprint against the fingerprint column
//! of the ledger and degrades gracefully on legacy ledgers that predate
//! that column.

pub mod fingerprint;
pub mod lookup;

pub use fingerprint::Fingerprint;
pub use lookup::{DuplicateCheck, DuplicateDetector, DuplicateRecord};
