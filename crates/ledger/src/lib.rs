//! `taxpipe-ledger` — schema-bounded, verified, garbage-tolerant ledger
//! persistence.
//!
//! The ledger is a spreadsheet-style grid with two fixed positional schemas
//! (invoice headers and line items). This crate owns the column contracts,
//! the narrow grid-storage trait the writer depends on, an in-memory grid
//! backend for tests and development, and the writer itself.

pub mod grid;
pub mod in_memory;
pub mod schema;
pub mod writer;

pub use grid::{GridError, GridStore};
pub use in_memory::InMemoryGrid;
pub use writer::{AppendReceipt, HeaderExtensions, LedgerConfig, LedgerError, LedgerWriter};
