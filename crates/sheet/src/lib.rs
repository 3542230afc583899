//! Workbook/sheet module for cotiza
//!
//! Provides the in-memory data model for quotation workbooks: scalar cell
//! values, ragged row grids, and order-preserving books, plus the xlsx codec
//! boundary (calamine for reads, rust_xlsxwriter for writes).
//!
//! # Examples
//!
//! ## Creating a sheet from data
//!
//! ```
//! use cotiza_sheet::{CellValue, Sheet};
//!
//! let mut sheet = Sheet::from_data(vec![
//!     vec!["Descripción", "Precio"],
//!     vec!["Cemento gris 50kg", "15082"],
//! ]);
//!
//! sheet.row_append(vec!["Arena lavada m3", "48000"]);
//! assert_eq!(sheet.row_count(), 3);
//! assert_eq!(sheet.get(1, 0), Some(&CellValue::from("Cemento gris 50kg")));
//! ```
//!
//! ## Working with books
//!
//! ```
//! use cotiza_sheet::{Book, Sheet};
//!
//! let mut book = Book::new();
//! book.add_sheet("Recursos", Sheet::new()).unwrap();
//! book.get_or_create_sheet("Ppto").row_append(vec![1, 2, 3]);
//!
//! assert_eq!(book.sheet_names(), vec!["Recursos", "Ppto"]);
//! ```
//!
//! Saving a [`Book`] with [`Book::save_xlsx`] writes to a sibling temp file
//! and renames it over the target, so readers never observe a half-written
//! workbook.

mod book;
mod cell;
mod error;
mod sheet;
mod xlsx;

/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet type.
pub use sheet::Sheet;
/// Re-export xlsx grid capacity.
pub use xlsx::XLSX_MAX_ROWS;
