//! Text report for a finished batch.

use super::result::{BatchResult, ItemOutcome, ItemResult};

/// Render the batch summary: per-item lines, then aggregate counts, the
/// success rate, the validation-status histogram and timing.
pub fn render_report(result: &BatchResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Batch {} - {} invoice(s)\n\n",
        result.batch_id, result.total
    ));

    for item in &result.items {
        out.push_str(&render_item(item));
        out.push('\n');
    }

    let histogram = result.status_histogram();
    let average_ms = if result.total == 0 {
        0
    } else {
        result.elapsed_ms / result.total as u64
    };

    out.push_str(&format!(
        "\nSuccessful: {} / {} ({:.1}%)\n",
        result.successful,
        result.total,
        result.success_rate()
    ));
    out.push_str(&format!(
        "Validation: {} OK, {} WARNING, {} ERROR\n",
        histogram.ok, histogram.warning, histogram.error
    ));
    out.push_str(&format!(
        "Elapsed: {} ms total, {} ms per invoice\n",
        result.elapsed_ms, average_ms
    ));

    out
}

fn render_item(item: &ItemResult) -> String {
    match &item.outcome {
        ItemOutcome::Success {
            document_number,
            validation_status,
            line_count,
            ..
        } => format!(
            "\u{2713} {document_number} - {line_count} line(s), {validation_status}, {} ms",
            item.elapsed_ms
        ),
        ItemOutcome::Failed {
            stage,
            message,
            duplicate_of,
        } => {
            let mut line = format!("\u{2717} {} - {stage}: {message}", item.label);
            if let Some(existing) = duplicate_of {
                line.push_str(&format!(
                    " (see {} at row {})",
                    existing.document_number, existing.row
                ));
            }
            line
        }
    }
}
