//! Batch and per-item result types.
//!
//! Expected outcomes are a tagged type: success, or failure at a named
//! stage with an optional duplicate cross-reference. The error channel is
//! reserved for faults inside collaborators; by the time results reach this
//! type everything is data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taxpipe_core::ValidationStatus;
use taxpipe_dedup::DuplicateRecord;

/// Batch identifier (UUIDv7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage an item failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    Parsing,
    DuplicateCheck,
    HeaderWrite,
    LineItemWrite,
    Unknown,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extraction => "Extraction",
            Stage::Parsing => "Parsing",
            Stage::DuplicateCheck => "Duplicate Check",
            Stage::HeaderWrite => "Header Write",
            Stage::LineItemWrite => "Line Item Write",
            Stage::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Success {
        document_number: String,
        validation_status: ValidationStatus,
        line_count: usize,
        has_warnings: bool,
        has_errors: bool,
    },
    Failed {
        stage: Stage,
        message: String,
        /// Set when the failure is a duplicate hit; cross-references the
        /// earlier ledger row.
        duplicate_of: Option<DuplicateRecord>,
    },
}

impl ItemOutcome {
    pub fn failed(stage: Stage, message: impl Into<String>) -> Self {
        Self::Failed {
            stage,
            message: message.into(),
            duplicate_of: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success { .. })
    }
}

/// Result for one invoice in a batch, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub label: String,
    pub elapsed_ms: u64,
    pub outcome: ItemOutcome,
}

/// Validation-status counts across successfully ingested items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistogram {
    pub ok: usize,
    pub warning: usize,
    pub error: usize,
}

/// Aggregate result of one batch invocation. One-shot: created per run,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: BatchId,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub items: Vec<ItemResult>,
}

impl BatchResult {
    /// Success rate in percent; zero for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }

    /// Validation-status histogram over the successful items.
    pub fn status_histogram(&self) -> StatusHistogram {
        let mut histogram = StatusHistogram::default();
        for item in &self.items {
            if let ItemOutcome::Success {
                validation_status, ..
            } = &item.outcome
            {
                match validation_status {
                    ValidationStatus::Ok => histogram.ok += 1,
                    ValidationStatus::Warning => histogram.warning += 1,
                    ValidationStatus::Error => histogram.error += 1,
                }
            }
        }
        histogram
    }
}
