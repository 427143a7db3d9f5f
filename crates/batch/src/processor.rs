//! The sequential batch orchestrator.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use taxpipe_dedup::{DuplicateCheck, DuplicateDetector, Fingerprint};
use taxpipe_ledger::{schema, HeaderExtensions, LedgerWriter};

use super::collaborators::{
    AuditLog, CatalogStore, InvoiceParsing, ParsedInvoice, TextExtraction,
};
use super::result::{BatchId, BatchResult, ItemOutcome, ItemResult, Stage};

/// One invoice to ingest: a label for reporting and the ordered scan pages.
#[derive(Debug, Clone)]
pub struct InvoiceJob {
    pub label: String,
    pub image_paths: Vec<PathBuf>,
}

impl InvoiceJob {
    pub fn new(label: impl Into<String>, image_paths: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            image_paths,
        }
    }
}

/// Per-invocation options.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Skip the fingerprint probe entirely (re-ingestion runs).
    pub suppress_duplicate_check: bool,
    /// Actor recorded in the tier-2 audit columns.
    pub actor: Option<String>,
    /// Recognition model recorded in the tier-2 audit columns.
    pub model_name: Option<String>,
    pub model_version: Option<String>,
}

impl BatchOptions {
    pub fn with_suppressed_duplicate_check(mut self, suppress: bool) -> Self {
        self.suppress_duplicate_check = suppress;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_model(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.model_name = Some(name.into());
        self.model_version = Some(version.into());
        self
    }
}

/// Drives invoices through extraction, parsing, duplicate detection and
/// persistence, one at a time.
///
/// Constructed once at the process entry point with its collaborators and
/// passed by reference; it holds no global state. Strictly sequential by
/// design: that is what keeps per-item isolation simple and keeps the
/// ledger's read-then-append sequence free of intra-process races.
pub struct BatchProcessor {
    extractor: Arc<dyn TextExtraction>,
    parser: Arc<dyn InvoiceParsing>,
    writer: Arc<LedgerWriter>,
    detector: DuplicateDetector,
    audit: Option<Arc<dyn AuditLog>>,
    catalog: Option<Arc<dyn CatalogStore>>,
}

impl BatchProcessor {
    pub fn new(
        extractor: Arc<dyn TextExtraction>,
        parser: Arc<dyn InvoiceParsing>,
        writer: Arc<LedgerWriter>,
        detector: DuplicateDetector,
    ) -> Self {
        Self {
            extractor,
            parser,
            writer,
            detector,
            audit: None,
            catalog: None,
        }
    }

    pub fn with_audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogStore>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Process a batch. The progress callback fires before each item; the
    /// returned result always covers every job, whatever failed in between.
    pub fn process(
        &self,
        jobs: &[InvoiceJob],
        mut on_progress: impl FnMut(usize, usize, &str),
        options: &BatchOptions,
    ) -> BatchResult {
        let batch_id = BatchId::new();
        let started = Instant::now();
        info!(%batch_id, total = jobs.len(), "batch started");

        let mut items = Vec::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            on_progress(index + 1, jobs.len(), &format!("Processing {}", job.label));

            let item_started = Instant::now();
            // The item boundary: a panic anywhere below becomes a failed
            // result and the loop moves on. The batch never aborts early.
            let outcome =
                match panic::catch_unwind(AssertUnwindSafe(|| self.process_item(job, options))) {
                    Ok(outcome) => outcome,
                    Err(payload) => {
                        let message = panic_message(payload);
                        error!(job = %job.label, panic = %message, "item failed with unexpected panic");
                        ItemOutcome::failed(Stage::Unknown, message)
                    }
                };

            items.push(ItemResult {
                label: job.label.clone(),
                elapsed_ms: item_started.elapsed().as_millis() as u64,
                outcome,
            });
        }

        let successful = items.iter().filter(|item| item.outcome.is_success()).count();
        let result = BatchResult {
            batch_id,
            total: jobs.len(),
            successful,
            failed: jobs.len() - successful,
            elapsed_ms: started.elapsed().as_millis() as u64,
            items,
        };
        info!(
            %batch_id,
            successful = result.successful,
            failed = result.failed,
            elapsed_ms = result.elapsed_ms,
            "batch finished"
        );
        result
    }

    fn process_item(&self, job: &InvoiceJob, options: &BatchOptions) -> ItemOutcome {
        let started = Instant::now();

        let extraction = match self.extractor.extract(&job.image_paths) {
            Ok(extraction) if !extraction.text.trim().is_empty() => extraction,
            Ok(_) => {
                return ItemOutcome::failed(Stage::Extraction, "extraction produced no text");
            }
            Err(e) => return ItemOutcome::failed(Stage::Extraction, e.to_string()),
        };

        let parsed = match self.parser.parse_with_validation(&extraction.text) {
            Ok(parsed) => parsed,
            Err(e) => return ItemOutcome::failed(Stage::Parsing, e.to_string()),
        };

        let fingerprint = Fingerprint::of(&parsed.header);
        if !options.suppress_duplicate_check {
            match self.detector.check(&fingerprint) {
                Ok(DuplicateCheck::Fresh) => {}
                Ok(DuplicateCheck::Duplicate(existing)) => {
                    warn!(
                        job = %job.label,
                        %fingerprint,
                        row = existing.row,
                        "duplicate invoice rejected"
                    );
                    if let Some(audit) = &self.audit {
                        if let Err(e) =
                            audit.record_duplicate_attempt(&fingerprint, &parsed.header, &existing)
                        {
                            warn!(error = %e, "duplicate-attempt audit log failed");
                        }
                    }
                    return ItemOutcome::Failed {
                        stage: Stage::DuplicateCheck,
                        message: format!(
                            "duplicate of {} at ledger row {}",
                            existing.document_number, existing.row
                        ),
                        duplicate_of: Some(existing),
                    };
                }
                Err(e) => return ItemOutcome::failed(Stage::DuplicateCheck, e.to_string()),
            }
        }

        let header_row = schema::header_row(&parsed.header);
        let receipt = if self.writer.config().extended {
            let extensions = HeaderExtensions {
                uploaded_at: Some(Utc::now()),
                uploaded_by: options.actor.clone(),
                model_name: options.model_name.clone(),
                model_version: options.model_version.clone(),
                processing_ms: Some(started.elapsed().as_millis() as u64),
                page_count: Some(extraction.pages.len()),
                fingerprint: Some(fingerprint.to_string()),
                duplicate_status: Some("UNIQUE".to_string()),
                ..HeaderExtensions::default()
            };
            self.writer
                .append_header_extended(&header_row, &parsed.validation, &extensions)
        } else {
            self.writer.append_header(&header_row, &parsed.validation)
        };
        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(e) => return ItemOutcome::failed(Stage::HeaderWrite, e.to_string()),
        };

        if !parsed.line_items.is_empty() {
            let line_rows: Vec<Vec<String>> = parsed
                .line_items
                .iter()
                .map(|item| schema::line_item_row(&parsed.header, item))
                .collect();
            if let Err(e) = self.writer.append_line_items(&line_rows) {
                return ItemOutcome::failed(Stage::LineItemWrite, e.to_string());
            }
        }

        // Catalog upkeep is fire-and-forget: a failure here is logged and
        // the item still counts as ingested.
        if let Some(catalog) = &self.catalog {
            self.update_catalogs(catalog.as_ref(), &parsed);
        }

        ItemOutcome::Success {
            document_number: receipt.document_number,
            validation_status: parsed.validation.status,
            line_count: parsed.line_items.len(),
            has_warnings: parsed.validation.has_warnings(),
            has_errors: parsed.validation.has_errors(),
        }
    }

    fn update_catalogs(&self, catalog: &dyn CatalogStore, parsed: &ParsedInvoice) {
        if let Some(tax_id) = &parsed.header.seller_tax_id {
            let name = parsed.header.seller_name.as_deref().unwrap_or("");
            if let Err(e) = catalog.upsert_party(tax_id, name) {
                warn!(error = %e, tax_id = %tax_id, "party catalog update failed");
            }
        }

        for item in &parsed.line_items {
            if let Some(code) = &item.hsn_code {
                let description = item.description.as_deref().unwrap_or("");
                if let Err(e) = catalog.upsert_hsn(code, description) {
                    warn!(error = %e, code = %code, "hsn catalog update failed");
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}
