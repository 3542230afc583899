use crate::book::Book;
use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Number of rows an xlsx sheet can hold; writes at or past this 0-based
/// index fail in the writer.
pub const XLSX_MAX_ROWS: usize = 1_048_576;

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel stores dates as day counts since 1899-12-30
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

/// Write one sheet's rows into a worksheet
fn write_sheet(worksheet: &mut Worksheet, name: &str, sheet: &Sheet) -> Result<()> {
    worksheet
        .set_name(name)
        .map_err(|e| SheetError::Serialize(e.to_string()))?;

    for (row_idx, row) in sheet.data().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let row_num = u32::try_from(row_idx)
                .map_err(|_| SheetError::Serialize("Row index overflow".to_string()))?;
            let col_num = u16::try_from(col_idx)
                .map_err(|_| SheetError::Serialize("Column index overflow".to_string()))?;

            match cell {
                CellValue::Null => {} // Leave empty
                CellValue::Bool(b) => {
                    worksheet
                        .write_boolean(row_num, col_num, *b)
                        .map_err(|e| SheetError::Serialize(e.to_string()))?;
                }
                // Note: Excel stores all numbers as f64, so integers > 2^53
                // may lose precision
                CellValue::Int(i) => {
                    worksheet
                        .write_number(row_num, col_num, *i as f64)
                        .map_err(|e| SheetError::Serialize(e.to_string()))?;
                }
                CellValue::Float(f) => {
                    worksheet
                        .write_number(row_num, col_num, *f)
                        .map_err(|e| SheetError::Serialize(e.to_string()))?;
                }
                CellValue::String(s) => {
                    worksheet
                        .write_string(row_num, col_num, s)
                        .map_err(|e| SheetError::Serialize(e.to_string()))?;
                }
            }
        }
    }

    Ok(())
}

impl Book {
    /// Load a book from an Excel file (all sheets)
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or read.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook: Xlsx<BufReader<File>> = open_workbook(path.as_ref())
            .map_err(|e: XlsxError| SheetError::Parse(e.to_string()))?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let mut book = Book::new();

        for sheet_name in sheet_names {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e: XlsxError| SheetError::Parse(e.to_string()))?;

            // The stored range starts at the first occupied cell; pad back to
            // the sheet origin so row and column indexes survive a roundtrip.
            let (row_offset, col_offset) = range
                .start()
                .map_or((0, 0), |(r, c)| (r as usize, c as usize));

            let mut data: Vec<Vec<CellValue>> = Vec::new();
            for _ in 0..row_offset {
                data.push(Vec::new());
            }
            for row in range.rows() {
                let mut cells: Vec<CellValue> = Vec::with_capacity(col_offset + row.len());
                cells.resize(col_offset, CellValue::Null);
                cells.extend(row.iter().map(data_to_cell_value));
                data.push(cells);
            }

            let mut sheet = Sheet::with_name(&sheet_name);
            *sheet.data_mut() = data;
            book.add_sheet(&sheet_name, sheet)?;
        }

        Ok(book)
    }

    /// Save the book to an Excel file.
    ///
    /// The workbook is serialized to a sibling `.tmp` file first and renamed
    /// over the target, so a crash mid-write never leaves a corrupt file at
    /// the live path. The rename stays on one filesystem because the temp
    /// file shares the target directory.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written.
    pub fn save_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file_name = path.file_name().ok_or_else(|| {
            SheetError::Serialize(format!("Invalid workbook path: {}", path.display()))
        })?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        let mut workbook = Workbook::new();
        for (name, sheet) in self.sheets() {
            let worksheet = workbook.add_worksheet();
            write_sheet(worksheet, name, sheet)?;
        }

        if let Err(e) = workbook.save(&tmp_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(SheetError::Serialize(e.to_string()));
        }
        std::fs::rename(&tmp_path, path)?;

        Ok(())
    }
}
