//! Fixed ledger schemas and A1 column arithmetic.
//!
//! Column order is part of the external contract and must not be reordered.
//! Tier-1 is the base header set; tier-2 appends audit, correction, dedup
//! and confidence columns. Downstream consumers address these sheets by
//! position, so writers pad and truncate to the exact widths defined here.

use taxpipe_core::{format_amount, InvoiceHeader, LineItem};

/// Tier-1 header schema: one row per ingested invoice.
pub const HEADER_COLUMNS: [&str; 24] = [
    "Invoice_Number",
    "Invoice_Date",
    "Document_Type",
    "Seller_Name",
    "Seller_GSTIN",
    "Seller_State_Code",
    "Buyer_Name",
    "Buyer_GSTIN",
    "Buyer_State_Code",
    "Ship_To_Name",
    "Ship_To_State_Code",
    "Place_Of_Supply",
    "Supply_Type",
    "Reverse_Charge",
    "Invoice_Value",
    "Taxable_Total",
    "Total_Tax",
    "IGST_Total",
    "CGST_Total",
    "SGST_Total",
    "Transporter_Name",
    "Eway_Bill_Number",
    "Validation_Status",
    "Validation_Remarks",
];

/// Tier-2 extension columns, appended after the tier-1 set. These are
/// resolved by name, never by hard-coded index.
pub const HEADER_EXTENSION_COLUMNS: [&str; 17] = [
    "Uploaded_At",
    "Uploaded_By",
    "Model_Name",
    "Model_Version",
    "Processing_Ms",
    "Page_Count",
    "Corrected",
    "Corrected_Fields",
    "Correction_Json",
    "Fingerprint",
    "Duplicate_Status",
    "Overall_Confidence",
    "Header_Confidence",
    "Line_Confidence",
    "Low_Confidence_Fields",
    "Needs_Review",
    "Review_Notes",
];

/// Line-item schema: one row per invoice line, linked by invoice number
/// and date.
pub const LINE_ITEM_COLUMNS: [&str; 19] = [
    "Invoice_Number",
    "Invoice_Date",
    "Line_Number",
    "Item_Code",
    "Description",
    "HSN_Code",
    "Quantity",
    "Unit",
    "Rate",
    "Discount",
    "Taxable_Value",
    "IGST_Rate",
    "IGST_Amount",
    "CGST_Rate",
    "CGST_Amount",
    "SGST_Rate",
    "SGST_Amount",
    "Total_Tax",
    "Line_Total",
];

/// Tier-1 header width.
pub const HEADER_WIDTH: usize = HEADER_COLUMNS.len();

/// Tier-2 header width.
pub const EXTENDED_WIDTH: usize = HEADER_WIDTH + HEADER_EXTENSION_COLUMNS.len();

/// Line-item width.
pub const LINE_ITEM_WIDTH: usize = LINE_ITEM_COLUMNS.len();

/// 1-indexed position of `Validation_Status` in the header schema.
pub const VALIDATION_STATUS_COLUMN: usize = 23;

/// 1-indexed position of `Validation_Remarks` in the header schema.
pub const VALIDATION_REMARKS_COLUMN: usize = 24;

/// 1-indexed position of the `Fingerprint` column in the tier-2 schema.
/// Ledgers narrower than this are legacy; duplicate detection degrades
/// gracefully on them.
pub const FINGERPRINT_COLUMN: usize = 34;

/// Resolve a tier-2 extension column to its 1-indexed position by name.
pub fn extension_column(name: &str) -> Option<usize> {
    HEADER_EXTENSION_COLUMNS
        .iter()
        .position(|column| *column == name)
        .map(|offset| HEADER_WIDTH + offset + 1)
}

/// Spreadsheet column identifier for a 1-indexed column: `1` is `A`,
/// `26` is `Z`, `27` is `AA`.
pub fn column_letter(column: usize) -> String {
    debug_assert!(column >= 1, "columns are 1-indexed");
    let mut remaining = column;
    let mut letters = String::new();
    while remaining > 0 {
        let digit = (remaining - 1) % 26;
        letters.insert(0, (b'A' + digit as u8) as char);
        remaining = (remaining - 1) / 26;
    }
    letters
}

/// A1 reference for a single cell.
pub fn cell_ref(column: usize, row: usize) -> String {
    format!("{}{row}", column_letter(column))
}

/// A1 reference for a rectangular range.
pub fn range_ref(
    first_column: usize,
    first_row: usize,
    last_column: usize,
    last_row: usize,
) -> String {
    format!(
        "{}:{}",
        cell_ref(first_column, first_row),
        cell_ref(last_column, last_row)
    )
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Render a header as a tier-1 row. The validation columns are left empty;
/// the writer injects them at append time.
pub fn header_row(header: &InvoiceHeader) -> Vec<String> {
    vec![
        text(&header.invoice_number),
        text(&header.invoice_date),
        text(&header.document_type),
        text(&header.seller_name),
        text(&header.seller_tax_id),
        text(&header.seller_state_code),
        text(&header.buyer_name),
        text(&header.buyer_tax_id),
        text(&header.buyer_state_code),
        text(&header.ship_to_name),
        text(&header.ship_to_state_code),
        text(&header.place_of_supply),
        text(&header.supply_type),
        text(&header.reverse_charge),
        format_amount(header.invoice_value),
        format_amount(header.taxable_total),
        format_amount(header.total_tax),
        format_amount(header.igst_total),
        format_amount(header.cgst_total),
        format_amount(header.sgst_total),
        text(&header.transporter_name),
        text(&header.eway_bill_number),
        String::new(),
        String::new(),
    ]
}

/// Render a line item as a line-item row, linked to its header.
pub fn line_item_row(header: &InvoiceHeader, item: &LineItem) -> Vec<String> {
    vec![
        text(&header.invoice_number),
        text(&header.invoice_date),
        item.line_number.to_string(),
        text(&item.item_code),
        text(&item.description),
        text(&item.hsn_code),
        format_amount(item.quantity),
        text(&item.unit),
        format_amount(item.rate),
        format_amount(item.discount),
        format_amount(item.taxable_value),
        format_amount(item.igst_rate),
        format_amount(item.igst_amount),
        format_amount(item.cgst_rate),
        format_amount(item.cgst_amount),
        format_amount(item.sgst_rate),
        format_amount(item.sgst_amount),
        format_amount(item.total_tax()),
        format_amount(item.line_total),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_widths_are_fixed() {
        assert_eq!(HEADER_WIDTH, 24);
        assert_eq!(EXTENDED_WIDTH, 41);
        assert_eq!(LINE_ITEM_WIDTH, 19);
        assert_eq!(HEADER_COLUMNS[VALIDATION_STATUS_COLUMN - 1], "Validation_Status");
        assert_eq!(HEADER_COLUMNS[VALIDATION_REMARKS_COLUMN - 1], "Validation_Remarks");
    }

    #[test]
    fn extension_columns_resolve_by_name() {
        assert_eq!(extension_column("Uploaded_At"), Some(25));
        assert_eq!(extension_column("Fingerprint"), Some(FINGERPRINT_COLUMN));
        assert_eq!(extension_column("Review_Notes"), Some(EXTENDED_WIDTH));
        assert_eq!(extension_column("Not_A_Column"), None);
    }

    #[test]
    fn column_letters_cross_the_z_boundary() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(24), "X");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(41), "AO");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(53), "BA");
    }

    #[test]
    fn header_row_matches_schema_width() {
        let row = header_row(&InvoiceHeader::default());
        assert_eq!(row.len(), HEADER_WIDTH);
        assert!(row[VALIDATION_STATUS_COLUMN - 1].is_empty());
    }

    #[test]
    fn line_item_row_links_back_to_header() {
        let header = InvoiceHeader {
            invoice_number: Some("INV-1".to_string()),
            invoice_date: Some("15/01/2024".to_string()),
            ..InvoiceHeader::default()
        };
        let item = LineItem {
            line_number: 2,
            taxable_value: 100.0,
            ..LineItem::default()
        };
        let row = line_item_row(&header, &item);
        assert_eq!(row.len(), LINE_ITEM_WIDTH);
        assert_eq!(row[0], "INV-1");
        assert_eq!(row[1], "15/01/2024");
        assert_eq!(row[2], "2");
        assert_eq!(row[10], "100.00");
    }
}
