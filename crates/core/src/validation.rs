//! Validation status and result model.
//!
//! Business-rule findings are **data**, never errors: the rule engine
//! returns them through this type and the ledger writer persists them
//! alongside the row they describe.

use serde::{Deserialize, Serialize};

/// Fixed string rendered when a result carries no findings at all.
pub const ALL_PASSED: &str = "All validations passed";

/// Overall validation status. `Error` dominates `Warning` dominates `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl core::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            ValidationStatus::Ok => "OK",
            ValidationStatus::Warning => "WARNING",
            ValidationStatus::Error => "ERROR",
        };
        f.write_str(text)
    }
}

/// Outcome of running the rule engine over a header and its line items.
///
/// Message order is preserved: findings appear in the order the checks
/// produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// A clean result with no findings.
    pub fn passed() -> Self {
        Self {
            status: ValidationStatus::Ok,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Build a result from collected messages, deriving the status by
    /// dominance.
    pub fn from_messages(errors: Vec<String>, warnings: Vec<String>) -> Self {
        let status = if !errors.is_empty() {
            ValidationStatus::Error
        } else if !warnings.is_empty() {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Ok
        };
        Self {
            status,
            errors,
            warnings,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Render the findings as two labeled blocks, or the fixed all-clear
    /// string when both lists are empty.
    pub fn summary(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() {
            return ALL_PASSED.to_string();
        }

        let mut blocks = Vec::new();
        if !self.errors.is_empty() {
            let mut block = String::from("ERRORS:");
            for message in &self.errors {
                block.push_str("\n- ");
                block.push_str(message);
            }
            blocks.push(block);
        }
        if !self.warnings.is_empty() {
            let mut block = String::from("WARNINGS:");
            for message in &self.warnings {
                block.push_str("\n- ");
                block.push_str(message);
            }
            blocks.push(block);
        }
        blocks.join("\n\n")
    }
}
