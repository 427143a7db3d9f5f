//! Defensive parsing for text-typed monetary fields.
//!
//! Every numeric field crosses the boundary as text produced by the
//! extraction collaborator. Parsing never fails: malformed or empty input
//! becomes zero, and the validation engine reconciles from there.

/// Parse a monetary amount from boundary text.
///
/// Tolerates currency markers, thousands separators and surrounding
/// whitespace. Invalid or empty input yields `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    let Some(start) = compact.find(|c: char| c.is_ascii_digit() || c == '-') else {
        return 0.0;
    };

    let tail = &compact[start..];
    let end = tail
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.' && *c != '-')
        .map(|(i, _)| i)
        .unwrap_or(tail.len());

    tail[..end].parse::<f64>().unwrap_or(0.0)
}

/// Parse an optional boundary field. Absent behaves like empty: zero.
pub fn parse_optional_amount(raw: Option<&str>) -> f64 {
    raw.map(parse_amount).unwrap_or(0.0)
}

/// Render an amount the way the ledger stores it: two decimal places.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}
