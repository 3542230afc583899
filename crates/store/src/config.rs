use std::path::{Path, PathBuf};

const DEFAULT_BACKUP_RETENTION: usize = 10;

/// Configuration for a workbook store.
///
/// Built once at startup and passed into the store; there is no process-wide
/// state behind it.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the live workbook file.
    pub workbook_path: PathBuf,
    /// Directory holding timestamped backup copies.
    pub backup_dir: PathBuf,
    /// Directory receiving exported copies.
    pub export_dir: PathBuf,
    /// How many backups to keep, newest first.
    pub backup_retention: usize,
}

impl StoreConfig {
    /// Create a config for a workbook path with sibling `backups/` and
    /// `exports/` directories and the default retention of 10.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(workbook_path: P) -> Self {
        let workbook_path = workbook_path.into();
        let parent = workbook_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        StoreConfig {
            backup_dir: parent.join("backups"),
            export_dir: parent.join("exports"),
            backup_retention: DEFAULT_BACKUP_RETENTION,
            workbook_path,
        }
    }

    /// Override the backup directory
    #[must_use]
    pub fn with_backup_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.backup_dir = dir.into();
        self
    }

    /// Override the export directory
    #[must_use]
    pub fn with_export_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Override the backup retention count
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.backup_retention = retention;
        self
    }
}
