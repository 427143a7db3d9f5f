//! Fingerprint derivation.
//!
//! Deterministic and side-effect-free: normalize the seller tax id, invoice
//! number and date, join them with `|`, hash with SHA-256 and keep the
//! first 16 hex characters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use taxpipe_core::InvoiceHeader;

/// Hex length kept from the 256-bit digest.
const FINGERPRINT_LEN: usize = 16;

/// Duplicate-detection key for an invoice header.
///
/// Always recomputed from a header, never stored as an entity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a header.
    pub fn of(header: &InvoiceHeader) -> Self {
        let seller = normalize_tax_id(header.seller_tax_id.as_deref().unwrap_or(""));
        let number = normalize_invoice_number(header.invoice_number.as_deref().unwrap_or(""));
        let date = normalize_date(header.invoice_date.as_deref().unwrap_or(""));

        let digest = Sha256::digest(format!("{seller}|{number}|{date}").as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(FINGERPRINT_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tax ids keep only alphanumerics, uppercased.
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Invoice numbers are trimmed and uppercased, and every run of whitespace
/// and `-`/`_`/`/` separators collapses into a single `-`, so that
/// `INV-2024-001`, `INV/2024/001` and `INV 2024 001` all normalize alike.
pub fn normalize_invoice_number(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.trim().chars() {
        if c.is_whitespace() || matches!(c, '-' | '_' | '/') {
            pending_separator = true;
        } else {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            for upper in c.to_uppercase() {
                out.push(upper);
            }
        }
    }

    out
}

/// Dates normalize to `YYYYMMDD`. Unparseable or missing input becomes the
/// empty string rather than a failure; an unreadable date still fingerprints.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    for format in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y%m%d").to_string();
        }
    }

    String::new()
}
