//! `taxpipe-validation` — tolerance-based tax-reconciliation rule engine.
//!
//! Pure, deterministic domain logic: the same header and line items always
//! yield the same result. No IO, no clock, no storage.

pub mod engine;

pub use engine::validate;
