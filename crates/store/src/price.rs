use cotiza_sheet::CellValue;
use serde::{Deserialize, Serialize};

/// A price as it arrives on the wire: a bare number or a formatted string
/// like `"$ 15.082"` or `"COP 1.250.000"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl Default for PriceValue {
    fn default() -> Self {
        PriceValue::Text(String::new())
    }
}

impl PriceValue {
    /// The price as a cell, keeping the raw form the caller sent.
    #[must_use]
    pub fn as_cell(&self) -> CellValue {
        match self {
            PriceValue::Number(n) => CellValue::Float(*n),
            PriceValue::Text(s) => CellValue::String(s.clone()),
        }
    }
}

/// Reduce a price to whole currency units.
///
/// String input keeps only its ASCII digits before parsing, which drops
/// currency symbols, thousands separators, and whitespace in one pass; empty
/// or non-numeric input yields 0. Numeric input is truncated, so decimal
/// fractions are discarded either way.
#[must_use]
pub fn extract_numeric_price(value: &PriceValue) -> i64 {
    match value {
        PriceValue::Number(n) => n.trunc() as i64,
        PriceValue::Text(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
    }
}
