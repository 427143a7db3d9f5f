use serde::{Deserialize, Serialize};

/// One invoice line. A header owns an ordered sequence of these; order is
/// significant and preserved all the way to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub line_number: u32,
    pub item_code: Option<String>,
    pub description: Option<String>,
    pub hsn_code: Option<String>,

    pub quantity: f64,
    pub unit: Option<String>,
    pub rate: f64,
    pub discount: f64,
    pub taxable_value: f64,

    pub igst_rate: f64,
    pub igst_amount: f64,
    pub cgst_rate: f64,
    pub cgst_amount: f64,
    pub sgst_rate: f64,
    pub sgst_amount: f64,

    pub line_total: f64,
}

impl LineItem {
    /// Total tax carried by this line across all components.
    pub fn total_tax(&self) -> f64 {
        self.igst_amount + self.cgst_amount + self.sgst_amount
    }

    /// The applicable rate for rate-math checks: the IGST rate when the line
    /// carries IGST, otherwise the sum of the CGST and SGST rates. `None`
    /// when no rate metadata is present; such lines are never penalized.
    pub fn inferred_rate(&self) -> Option<f64> {
        let rate = if self.igst_amount > 0.0 {
            self.igst_rate
        } else {
            self.cgst_rate + self.sgst_rate
        };
        (rate > 0.0).then_some(rate)
    }
}
