//! Reconciliation checks for a header against its line items.
//!
//! Four independent checks contribute findings:
//! totals reconciliation for taxable value and tax, tax-type consistency
//! for the supply type, and per-line rate math. Findings are data; the
//! overall status is derived by dominance.

use taxpipe_core::{InvoiceHeader, LineItem, SupplyType, ValidationResult};

/// Absolute tolerance for reconciliation, in currency units.
const ABSOLUTE_TOLERANCE: f64 = 0.50;

/// Relative tolerance for reconciliation, in percent of the declared total.
const PERCENT_TOLERANCE: f64 = 1.0;

/// Reconcile a header against its line items.
pub fn validate(header: &InvoiceHeader, line_items: &[LineItem]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let line_taxable: f64 = line_items.iter().map(|item| item.taxable_value).sum();
    reconcile_total(
        "Taxable value",
        header.taxable_total,
        line_taxable,
        &mut errors,
        &mut warnings,
    );

    let line_tax: f64 = line_items.iter().map(LineItem::total_tax).sum();
    reconcile_total(
        "Tax total",
        header.total_tax,
        line_tax,
        &mut errors,
        &mut warnings,
    );

    check_tax_type_consistency(header, &mut errors, &mut warnings);
    check_line_rate_math(line_items, &mut warnings);

    ValidationResult::from_messages(errors, warnings)
}

/// Tolerance ladder shared by the two total checks: differences within the
/// absolute tolerance pass silently, within the relative tolerance warn,
/// beyond it error.
fn reconcile_total(
    label: &str,
    declared: f64,
    computed: f64,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let diff = (declared - computed).abs();
    if diff <= ABSOLUTE_TOLERANCE {
        return;
    }

    let pct = if declared != 0.0 {
        diff / declared * 100.0
    } else {
        0.0
    };

    if pct <= PERCENT_TOLERANCE {
        warnings.push(format!(
            "{label} differs by {diff:.2} ({pct:.2}% of declared) - minor difference, likely rounding"
        ));
    } else {
        errors.push(format!(
            "{label} mismatch: declared {declared:.2}, line items sum to {computed:.2}, difference {diff:.2}"
        ));
    }
}

/// Which tax components a header may carry is fixed by its supply type.
/// The final check is a safety net that fires regardless of how the
/// supply-type text classified; a duplicate finding is acceptable.
fn check_tax_type_consistency(
    header: &InvoiceHeader,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let igst = header.igst_total > 0.0;
    let cgst = header.cgst_total > 0.0;
    let sgst = header.sgst_total > 0.0;

    match header.supply() {
        SupplyType::IntraState => {
            if igst {
                errors.push("Intra-state supply must not carry IGST".to_string());
            }
            if !cgst && !sgst {
                errors.push("Intra-state supply must have CGST and SGST".to_string());
            } else if cgst != sgst {
                warnings.push(
                    "Intra-state supply carries only one of CGST and SGST".to_string(),
                );
            }
        }
        SupplyType::InterState => {
            if cgst || sgst {
                errors.push("Inter-state supply must not carry CGST or SGST".to_string());
            }
            if !igst {
                errors.push("Inter-state supply must have IGST".to_string());
            }
        }
        SupplyType::Unknown => {}
    }

    if igst && (cgst || sgst) {
        errors.push("IGST and CGST/SGST must not both be present".to_string());
    }
}

/// Per-line rate math is advisory only: lines with no tax, no taxable value
/// or no inferable rate are skipped, and mismatches warn rather than error.
fn check_line_rate_math(line_items: &[LineItem], warnings: &mut Vec<String>) {
    for item in line_items {
        let actual = item.total_tax();
        if actual == 0.0 || item.taxable_value == 0.0 {
            continue;
        }
        let Some(rate) = item.inferred_rate() else {
            continue;
        };

        let expected = item.taxable_value * rate / 100.0;
        if (expected - actual).abs() > ABSOLUTE_TOLERANCE {
            warnings.push(format!(
                "Line {}: tax {:.2} does not match {:.2}% of taxable value {:.2} (expected {:.2})",
                item.line_number, actual, rate, item.taxable_value, expected
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use taxpipe_core::ValidationStatus;

    fn header(supply: &str, taxable: f64, tax: f64, igst: f64, cgst: f64, sgst: f64) -> InvoiceHeader {
        InvoiceHeader {
            invoice_number: Some("INV-2024-001".to_string()),
            supply_type: Some(supply.to_string()),
            taxable_total: taxable,
            total_tax: tax,
            igst_total: igst,
            cgst_total: cgst,
            sgst_total: sgst,
            ..InvoiceHeader::default()
        }
    }

    fn line(line_number: u32, taxable: f64, cgst_rate: f64, sgst_rate: f64, tax: f64) -> LineItem {
        LineItem {
            line_number,
            taxable_value: taxable,
            cgst_rate,
            sgst_rate,
            cgst_amount: tax / 2.0,
            sgst_amount: tax / 2.0,
            ..LineItem::default()
        }
    }

    #[test]
    fn taxable_within_absolute_tolerance_passes() {
        let header = header("intra-state", 100.0, 18.0, 0.0, 9.0, 9.0);
        let lines = vec![line(1, 100.40, 9.0, 9.0, 18.0)];
        let result = validate(&header, &lines);
        assert_eq!(result.status, ValidationStatus::Ok, "{:?}", result);
    }

    #[test]
    fn taxable_within_percent_tolerance_warns() {
        let header = header("intra-state", 100.0, 18.0, 0.0, 9.0, 9.0);
        let lines = vec![line(1, 100.60, 9.0, 9.0, 18.0)];
        let result = validate(&header, &lines);
        assert_eq!(result.status, ValidationStatus::Warning);
        assert!(result.warnings.iter().any(|w| w.contains("Taxable value")));
    }

    #[test]
    fn taxable_beyond_percent_tolerance_errors() {
        let header = header("intra-state", 1000.0, 180.0, 0.0, 90.0, 90.0);
        let lines = vec![line(1, 950.0, 9.0, 9.0, 180.0)];
        let result = validate(&header, &lines);
        assert_eq!(result.status, ValidationStatus::Error);
        assert!(result.errors.iter().any(|e| e.contains("Taxable value mismatch")));
    }

    #[test]
    fn zero_declared_total_warns_instead_of_dividing() {
        let header = header("intra-state", 0.0, 18.0, 0.0, 9.0, 9.0);
        let lines = vec![line(1, 100.0, 9.0, 9.0, 18.0)];
        let result = validate(&header, &lines);
        assert!(result.warnings.iter().any(|w| w.contains("Taxable value")));
        assert!(!result.errors.iter().any(|e| e.contains("Taxable value")));
    }

    #[test]
    fn tax_total_uses_same_ladder() {
        let header = header("intra-state", 100.0, 100.0, 0.0, 50.0, 50.0);
        let lines = vec![line(1, 100.0, 9.0, 9.0, 99.6)];
        let result = validate(&header, &lines);
        assert!(!result.errors.iter().any(|m| m.contains("Tax total")));
        assert!(!result.warnings.iter().any(|m| m.contains("Tax total")));

        let lines = vec![line(1, 100.0, 9.0, 9.0, 99.3)];
        let result = validate(&header, &lines);
        assert!(result.warnings.iter().any(|w| w.contains("Tax total")));

        let lines = vec![line(1, 100.0, 9.0, 9.0, 50.0)];
        let result = validate(&header, &lines);
        assert!(result.errors.iter().any(|e| e.contains("Tax total mismatch")));
    }

    #[test]
    fn intra_state_with_igst_errors() {
        let header = header("intra-state", 100.0, 18.0, 18.0, 0.0, 0.0);
        let result = validate(&header, &[]);
        assert!(result.errors.iter().any(|e| e.contains("must not carry IGST")));
        assert!(result.errors.iter().any(|e| e.contains("must have CGST and SGST")));
    }

    #[test]
    fn intra_state_with_single_component_warns() {
        let header = header("intra-state", 100.0, 9.0, 0.0, 9.0, 0.0);
        let result = validate(&header, &[]);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("only one of CGST and SGST")));
    }

    #[test]
    fn inter_state_rules() {
        let header = header("inter-state", 100.0, 18.0, 0.0, 9.0, 9.0);
        let result = validate(&header, &[]);
        assert!(result.errors.iter().any(|e| e.contains("must not carry CGST or SGST")));
        assert!(result.errors.iter().any(|e| e.contains("must have IGST")));
    }

    #[test]
    fn safety_net_fires_for_unknown_supply_type() {
        let header = header("domestic", 100.0, 36.0, 18.0, 9.0, 9.0);
        let result = validate(&header, &[]);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("must not both be present")));
    }

    #[test]
    fn line_rate_mismatch_warns_but_never_errors() {
        let header = header("intra-state", 100.0, 30.0, 0.0, 15.0, 15.0);
        let lines = vec![LineItem {
            line_number: 1,
            taxable_value: 100.0,
            cgst_rate: 9.0,
            sgst_rate: 9.0,
            cgst_amount: 15.0,
            sgst_amount: 15.0,
            ..LineItem::default()
        }];
        let result = validate(&header, &lines);
        assert!(result.warnings.iter().any(|w| w.contains("Line 1")));
        assert!(!result.errors.iter().any(|e| e.contains("Line 1")));
    }

    #[test]
    fn zero_tax_and_zero_taxable_lines_are_skipped() {
        let header = header("intra-state", 0.0, 0.0, 0.0, 0.0, 0.0);
        let lines = vec![
            LineItem {
                line_number: 1,
                taxable_value: 100.0,
                ..LineItem::default()
            },
            LineItem {
                line_number: 2,
                cgst_amount: 9.0,
                sgst_amount: 9.0,
                ..LineItem::default()
            },
        ];
        let result = validate(&header, &lines);
        assert!(!result.warnings.iter().any(|w| w.contains("Line")));
    }

    #[test]
    fn line_without_rate_metadata_is_never_penalized() {
        let header = header("intra-state", 100.0, 18.0, 0.0, 9.0, 9.0);
        let lines = vec![LineItem {
            line_number: 1,
            taxable_value: 100.0,
            cgst_amount: 9.0,
            sgst_amount: 9.0,
            ..LineItem::default()
        }];
        let result = validate(&header, &lines);
        assert!(!result.warnings.iter().any(|w| w.contains("Line 1")));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: validation is pure - the same input always yields the
        /// same result, and the status always agrees with the message lists.
        #[test]
        fn validation_is_deterministic_and_status_consistent(
            taxable in 0.0f64..10_000.0,
            tax in 0.0f64..2_000.0,
            igst in 0.0f64..500.0,
            cgst in 0.0f64..500.0,
            line_taxable in 0.0f64..10_000.0,
        ) {
            let header = header("intra-state", taxable, tax, igst, cgst, cgst);
            let lines = vec![line(1, line_taxable, 9.0, 9.0, tax)];

            let first = validate(&header, &lines);
            let second = validate(&header, &lines);
            prop_assert_eq!(&first, &second);

            let expected = ValidationResult::from_messages(
                first.errors.clone(),
                first.warnings.clone(),
            );
            prop_assert_eq!(first.status, expected.status);
        }
    }
}
