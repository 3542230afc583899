use crate::backup::{is_bare_file_name, timestamp_token, BackupInfo, BackupManager};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::layout::{format_row, Product, RowFormat};
use chrono::{DateTime, Local, Utc};
use cotiza_sheet::{Book, CellValue, XLSX_MAX_ROWS};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use tokio::sync::Mutex;
use tracing::info;

/// The workbook as JSON-friendly rectangular row grids plus file metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookReport {
    pub sheets: IndexMap<String, Vec<Vec<CellValue>>>,
    pub file_size: u64,
    pub modified: DateTime<Utc>,
}

/// Result of replacing the workbook contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub sheets_saved: usize,
    /// Name of the pre-save backup; `None` when the save created the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

/// Result of inserting formatted product rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutcome {
    pub sheet: String,
    pub format: RowFormat,
    pub start_row: usize,
    pub rows_added: usize,
    pub sheet_created: bool,
    pub backup: String,
}

/// Result of exporting a copy of the live workbook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub file_name: String,
    pub path: String,
    pub size: u64,
}

/// Coordinates every read and mutation of one workbook file.
///
/// All operations hold the instance mutex for their full duration, so two
/// mutators can never interleave their read/modify/write cycles. One store
/// instance manages one workbook path, which makes the instance lock the
/// per-path lock.
#[derive(Debug)]
pub struct WorkbookStore {
    config: StoreConfig,
    backups: BackupManager,
    lock: Mutex<()>,
}

fn blank_to_empty_string(cell: CellValue) -> CellValue {
    if cell.is_null() {
        CellValue::String(String::new())
    } else {
        cell
    }
}

fn check_row_span(start: usize, rows: usize) -> Result<()> {
    let fits = start
        .checked_add(rows)
        .is_some_and(|end| end <= XLSX_MAX_ROWS);
    if fits {
        Ok(())
    } else {
        Err(StoreError::RowOutOfRange {
            row: start,
            max: XLSX_MAX_ROWS,
        })
    }
}

impl WorkbookStore {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        let backups = BackupManager::new(&config);
        WorkbookStore {
            config,
            backups,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn require_workbook(&self) -> Result<()> {
        if self.config.workbook_path.exists() {
            Ok(())
        } else {
            Err(StoreError::WorkbookNotFound {
                path: self.config.workbook_path.clone(),
            })
        }
    }

    fn file_stem(&self) -> &str {
        self.config
            .workbook_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("workbook")
    }

    /// Read the whole workbook, every sheet padded to a rectangle with blank
    /// cells rendered as empty strings.
    ///
    /// Read-only; two loads without an intervening write see the same data.
    ///
    /// # Errors
    ///
    /// `WorkbookNotFound` when there is no file at the configured path.
    pub async fn load(&self) -> Result<WorkbookReport> {
        let _guard = self.lock.lock().await;
        self.require_workbook()?;

        let book = Book::from_xlsx(&self.config.workbook_path)?;
        let mut sheets = IndexMap::new();
        for (name, sheet) in book.sheets() {
            let rows: Vec<Vec<CellValue>> = sheet
                .to_uniform_rows()
                .into_iter()
                .map(|row| row.into_iter().map(blank_to_empty_string).collect())
                .collect();
            sheets.insert(name.to_string(), rows);
        }

        let meta = fs::metadata(&self.config.workbook_path)?;
        Ok(WorkbookReport {
            sheets,
            file_size: meta.len(),
            modified: DateTime::<Utc>::from(meta.modified()?),
        })
    }

    /// Replace the entire workbook with the posted sheet set.
    ///
    /// The live file is backed up first when one exists; a first-time save
    /// creates it fresh with nothing to back up. The write itself goes
    /// through the atomic temp-and-rename path.
    pub async fn save_sheets(
        &self,
        sheets: IndexMap<String, Vec<Vec<CellValue>>>,
    ) -> Result<SaveOutcome> {
        let _guard = self.lock.lock().await;

        let backup = if self.config.workbook_path.exists() {
            Some(self.backups.create_backup()?.name)
        } else {
            None
        };

        if let Some(parent) = self.config.workbook_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let sheets_saved = sheets.len();
        let book = Book::from_dict(sheets);
        book.save_xlsx(&self.config.workbook_path)?;

        info!(sheets = sheets_saved, "workbook saved");
        Ok(SaveOutcome {
            sheets_saved,
            backup,
        })
    }

    /// Insert formatted product rows into one sheet and persist the book.
    ///
    /// A backup is taken before anything is touched. Rows land at
    /// `start_row` when given, otherwise after the last existing row; each
    /// write overwrites whatever occupied that row. Index-bearing layouts
    /// count from the batch's own first product.
    ///
    /// # Errors
    ///
    /// `WorkbookNotFound` when there is no live workbook to mutate;
    /// `RowOutOfRange` when the requested rows do not fit the xlsx grid.
    pub async fn add_rows(
        &self,
        sheet_name: &str,
        products: &[Product],
        start_row: Option<usize>,
        format: RowFormat,
    ) -> Result<AddOutcome> {
        let _guard = self.lock.lock().await;

        // Reject rows past the grid before the backup copy is taken.
        if let Some(row) = start_row {
            check_row_span(row, products.len())?;
        }

        let backup = self.backups.create_backup()?;
        let mut book = Book::from_xlsx(&self.config.workbook_path)?;

        let sheet_created = !book.has_sheet(sheet_name);
        let sheet = book.get_or_create_sheet(sheet_name);
        let offset = start_row.unwrap_or_else(|| sheet.row_count());
        check_row_span(offset, products.len())?;
        let today = Local::now().date_naive();

        for (i, product) in products.iter().enumerate() {
            sheet.set_row(offset + i, format_row(format, product, i, today));
        }

        book.save_xlsx(&self.config.workbook_path)?;

        info!(
            sheet = sheet_name,
            rows = products.len(),
            start_row = offset,
            format = ?format,
            "product rows written"
        );

        Ok(AddOutcome {
            sheet: sheet_name.to_string(),
            format,
            start_row: offset,
            rows_added: products.len(),
            sheet_created,
            backup: backup.name,
        })
    }

    /// Copy the live workbook into the export directory.
    ///
    /// The caller's name must be a bare file name; `.xlsx` is appended when
    /// missing. Without a name the copy is stamped
    /// `<stem>_export_<timestamp>.xlsx`.
    pub async fn export_copy(&self, file_name: Option<String>) -> Result<ExportInfo> {
        let _guard = self.lock.lock().await;
        self.require_workbook()?;

        let name = match file_name {
            Some(name) => {
                if !is_bare_file_name(&name) {
                    return Err(StoreError::InvalidFileName { name });
                }
                if name.ends_with(".xlsx") {
                    name
                } else {
                    format!("{name}.xlsx")
                }
            }
            None => format!(
                "{}_export_{}.xlsx",
                self.file_stem(),
                timestamp_token(Utc::now())
            ),
        };

        fs::create_dir_all(&self.config.export_dir)?;
        let dest = self.config.export_dir.join(&name);
        fs::copy(&self.config.workbook_path, &dest)?;
        let meta = fs::metadata(&dest)?;

        info!(export = %name, size = meta.len(), "workbook exported");
        Ok(ExportInfo {
            file_name: name,
            path: dest.display().to_string(),
            size: meta.len(),
        })
    }

    /// List retained backups, newest first.
    pub async fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        let _guard = self.lock.lock().await;
        self.backups.list_backups()
    }

    /// Copy the named backup over the live workbook.
    ///
    /// Destructive: the current state is not backed up before it is replaced.
    pub async fn restore_backup(&self, name: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.backups.restore_backup(name)
    }
}
