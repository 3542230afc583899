use crate::price::{extract_numeric_price, PriceValue};
use chrono::NaiveDate;
use cotiza_sheet::CellValue;
use serde::{Deserialize, Serialize};

/// A product record as posted by the quotation UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
    pub title: String,
    pub source: String,
    pub price: PriceValue,
    pub search_term: String,
    pub origin: String,
}

/// Column layout requested for inserted rows.
///
/// Unknown wire values fall back to the plain three-column layout rather
/// than failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowFormat {
    /// [title, source, numeric price, search term, current date, origin]
    Recursos,
    /// [1-based batch index, title, quantity, unit price, total, source, search term]
    Ppto,
    /// [title, "MATERIAL", quantity, "UND", unit price, total, source]
    Apu,
    /// [title, raw price, source]
    #[default]
    #[serde(other)]
    Plain,
}

impl RowFormat {
    /// Number of columns the layout produces.
    #[must_use]
    pub fn column_count(self) -> usize {
        match self {
            RowFormat::Recursos => 6,
            RowFormat::Ppto | RowFormat::Apu => 7,
            RowFormat::Plain => 3,
        }
    }
}

/// Format one product into the fixed column layout for `format`.
///
/// `index` is the product's 0-based position within the inserted batch;
/// `ppto` writes it 1-based. Quantity is fixed at 1, so the total column
/// equals the unit price.
#[must_use]
pub fn format_row(
    format: RowFormat,
    product: &Product,
    index: usize,
    today: NaiveDate,
) -> Vec<CellValue> {
    let unit_price = extract_numeric_price(&product.price);

    match format {
        RowFormat::Recursos => vec![
            CellValue::from(product.title.clone()),
            CellValue::from(product.source.clone()),
            CellValue::Int(unit_price),
            CellValue::from(product.search_term.clone()),
            CellValue::from(today.to_string()),
            CellValue::from(product.origin.clone()),
        ],
        RowFormat::Ppto => vec![
            CellValue::Int(index as i64 + 1),
            CellValue::from(product.title.clone()),
            CellValue::Int(1),
            CellValue::Int(unit_price),
            CellValue::Int(unit_price),
            CellValue::from(product.source.clone()),
            CellValue::from(product.search_term.clone()),
        ],
        RowFormat::Apu => vec![
            CellValue::from(product.title.clone()),
            CellValue::from("MATERIAL"),
            CellValue::Int(1),
            CellValue::from("UND"),
            CellValue::Int(unit_price),
            CellValue::Int(unit_price),
            CellValue::from(product.source.clone()),
        ],
        RowFormat::Plain => vec![
            CellValue::from(product.title.clone()),
            product.price.as_cell(),
            CellValue::from(product.source.clone()),
        ],
    }
}
