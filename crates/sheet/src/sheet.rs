use crate::cell::CellValue;

/// A sheet representing a 2D grid of cells (row-major storage)
///
/// Rows may be ragged: the first row is plain data like any other (no header
/// parsing), and nothing forces rows to share a width.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let converted: Vec<Vec<CellValue>> = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        Sheet {
            name: "Sheet1".to_string(),
            data: converted,
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Get the number of columns (width of the widest row)
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the sheet is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // ===== Cell and Row Access =====

    /// Get a cell value by row and column index (0-based)
    ///
    /// Returns `None` outside the grid; ragged rows make that an ordinary case.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.data.get(row).and_then(|r| r.get(col))
    }

    /// Get an entire row by index (0-based)
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// Append a row to the end of the sheet
    pub fn row_append<T: Into<CellValue>>(&mut self, row: Vec<T>) {
        self.data.push(row.into_iter().map(Into::into).collect());
    }

    /// Write a row at a specific index, overwriting whatever is there.
    ///
    /// Rows between the current end and `index` are padded in as empty rows;
    /// existing rows are never shifted down.
    pub fn set_row<T: Into<CellValue>>(&mut self, index: usize, row: Vec<T>) {
        while self.data.len() <= index {
            self.data.push(Vec::new());
        }
        self.data[index] = row.into_iter().map(Into::into).collect();
    }

    /// Get rows iterator
    pub fn rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter()
    }

    /// Get internal data reference
    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Get mutable internal data reference
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }

    // ===== Conversion =====

    /// Return the rows padded with `Null` to the width of the widest row.
    #[must_use]
    pub fn to_uniform_rows(&self) -> Vec<Vec<CellValue>> {
        let width = self.col_count();
        self.data
            .iter()
            .map(|row| {
                let mut out = row.clone();
                out.resize(width, CellValue::Null);
                out
            })
            .collect()
    }
}
