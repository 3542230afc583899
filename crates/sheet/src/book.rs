use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use indexmap::IndexMap;

/// A book containing multiple sheets (preserves insertion order)
#[derive(Debug, Clone, Default)]
pub struct Book {
    sheets: IndexMap<String, Sheet>,
}

impl Book {
    /// Create a new empty book
    #[must_use]
    pub fn new() -> Self {
        Book {
            sheets: IndexMap::new(),
        }
    }

    /// Get the number of sheets
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the book is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get all sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Check if a sheet exists
    #[must_use]
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    // ===== Sheet Access =====

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .get(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Get a mutable sheet by name
    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Get a sheet by name, appending a new empty sheet when absent.
    pub fn get_or_create_sheet(&mut self, name: &str) -> &mut Sheet {
        self.sheets
            .entry(name.to_string())
            .or_insert_with(|| Sheet::with_name(name))
    }

    // ===== Sheet Management =====

    /// Add a sheet to the book
    pub fn add_sheet(&mut self, name: &str, sheet: Sheet) -> Result<()> {
        if self.sheets.contains_key(name) {
            return Err(SheetError::SheetAlreadyExists {
                name: name.to_string(),
            });
        }

        let mut sheet = sheet;
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    /// Create a book from a dictionary of sheet name -> 2D data.
    #[must_use]
    pub fn from_dict<T: Into<CellValue>>(sheets: IndexMap<String, Vec<Vec<T>>>) -> Self {
        let mut book = Book::new();
        for (name, data) in sheets {
            let mut sheet = Sheet::from_data(data);
            sheet.set_name(&name);
            book.sheets.insert(name, sheet);
        }
        book
    }

    /// Convert the book into a dictionary of sheet name -> 2D cell data.
    #[must_use]
    pub fn to_dict(&self) -> IndexMap<String, Vec<Vec<CellValue>>> {
        self.sheets
            .iter()
            .map(|(name, sheet)| (name.clone(), sheet.data().clone()))
            .collect()
    }

    // ===== Iteration =====

    /// Iterate over sheets
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(k, v)| (k.as_str(), v))
    }
}
