use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while operating on the workbook store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Workbook not found: {}", path.display())]
    WorkbookNotFound { path: PathBuf },

    #[error("Backup not found: {name}")]
    BackupNotFound { name: String },

    #[error("Invalid file name: {name}")]
    InvalidFileName { name: String },

    #[error("Start row {row} is beyond the workbook limit of {max} rows")]
    RowOutOfRange { row: usize, max: usize },

    #[error(transparent)]
    Sheet(#[from] cotiza_sheet::SheetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
