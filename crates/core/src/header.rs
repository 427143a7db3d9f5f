use serde::{Deserialize, Serialize};

/// Supply classification derived from the free-text supply-type field.
///
/// Anything that is not recognizably intra- or inter-state stays `Unknown`;
/// the tax-type safety-net check still applies to such headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    IntraState,
    InterState,
    Unknown,
}

impl SupplyType {
    /// Classify the boundary text of a supply-type field.
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unknown;
        };
        let lowered = raw.trim().to_lowercase();
        if lowered.contains("intra") {
            Self::IntraState
        } else if lowered.contains("inter") {
            Self::InterState
        } else {
            Self::Unknown
        }
    }
}

/// Structured invoice header as produced by the parsing collaborator.
///
/// Identity and classification fields are optional: the recognition service
/// may fail to find them, and absent is distinct from empty. Monetary fields
/// arrive as text and are parsed defensively (see [`crate::amount`]) before
/// they land here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub document_type: Option<String>,

    pub seller_name: Option<String>,
    pub seller_tax_id: Option<String>,
    pub seller_state_code: Option<String>,

    pub buyer_name: Option<String>,
    pub buyer_tax_id: Option<String>,
    pub buyer_state_code: Option<String>,

    pub ship_to_name: Option<String>,
    pub ship_to_state_code: Option<String>,

    pub place_of_supply: Option<String>,
    pub supply_type: Option<String>,
    pub reverse_charge: Option<String>,

    pub invoice_value: f64,
    pub taxable_total: f64,
    pub total_tax: f64,
    pub igst_total: f64,
    pub cgst_total: f64,
    pub sgst_total: f64,

    pub transporter_name: Option<String>,
    pub eway_bill_number: Option<String>,
}

impl InvoiceHeader {
    /// Classified supply type of this header.
    pub fn supply(&self) -> SupplyType {
        SupplyType::classify(self.supply_type.as_deref())
    }
}
