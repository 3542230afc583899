use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One retained backup copy of the workbook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Copies the live workbook aside before mutations and prunes old copies.
///
/// Backups are named `<stem>_backup_<timestamp>.<ext>`, where the timestamp
/// is the UTC instant with `:` and `.` replaced by `-`. That keeps the names
/// filesystem-safe while lexicographic descending order stays
/// reverse-chronological.
#[derive(Debug, Clone)]
pub struct BackupManager {
    workbook_path: PathBuf,
    backup_dir: PathBuf,
    retention: usize,
}

/// True when `name` is a single path component, with no separators or
/// traversal in it.
pub(crate) fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().is_some_and(|f| f == name)
}

/// UTC instant with millisecond precision, with `:` and `.` replaced by `-`
/// so the token is safe inside a file name.
pub(crate) fn timestamp_token(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

impl BackupManager {
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        BackupManager {
            workbook_path: config.workbook_path.clone(),
            backup_dir: config.backup_dir.clone(),
            retention: config.backup_retention,
        }
    }

    fn file_stem(&self) -> &str {
        self.workbook_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("workbook")
    }

    fn file_extension(&self) -> &str {
        self.workbook_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("xlsx")
    }

    fn backup_prefix(&self) -> String {
        format!("{}_backup_", self.file_stem())
    }

    /// Copy the live workbook into the backup directory, then prune entries
    /// beyond the retention count.
    ///
    /// # Errors
    ///
    /// Fails with `WorkbookNotFound` when there is no live workbook, and
    /// propagates copy/delete failures without retrying.
    pub fn create_backup(&self) -> Result<BackupInfo> {
        self.create_backup_at(Utc::now())
    }

    fn create_backup_at(&self, now: DateTime<Utc>) -> Result<BackupInfo> {
        if !self.workbook_path.exists() {
            return Err(StoreError::WorkbookNotFound {
                path: self.workbook_path.clone(),
            });
        }

        fs::create_dir_all(&self.backup_dir)?;

        let name = format!(
            "{}{}.{}",
            self.backup_prefix(),
            timestamp_token(now),
            self.file_extension()
        );
        let dest = self.backup_dir.join(&name);
        fs::copy(&self.workbook_path, &dest)?;

        let pruned = self.prune()?;
        if pruned > 0 {
            debug!(pruned, "removed backups beyond retention");
        }

        let meta = fs::metadata(&dest)?;
        info!(backup = %name, size = meta.len(), "workbook backed up");

        Ok(BackupInfo {
            name,
            size: meta.len(),
            modified: DateTime::<Utc>::from(meta.modified()?),
        })
    }

    /// Delete every backup beyond the newest `retention`, returning how many
    /// were removed.
    fn prune(&self) -> Result<usize> {
        let mut names = self.backup_file_names()?;
        names.sort_unstable_by(|a, b| b.cmp(a));

        let stale = names.split_off(names.len().min(self.retention));
        for name in &stale {
            fs::remove_file(self.backup_dir.join(name))?;
        }
        Ok(stale.len())
    }

    fn backup_file_names(&self) -> Result<Vec<String>> {
        let prefix = self.backup_prefix();
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(&prefix) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// List the retained backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = self.backup_file_names()?;
        names.sort_unstable_by(|a, b| b.cmp(a));

        let mut backups = Vec::with_capacity(names.len());
        for name in names {
            let meta = fs::metadata(self.backup_dir.join(&name))?;
            backups.push(BackupInfo {
                name,
                size: meta.len(),
                modified: DateTime::<Utc>::from(meta.modified()?),
            });
        }
        Ok(backups)
    }

    /// Copy the named backup over the live workbook.
    ///
    /// Destructive: the pre-restore state is not backed up first, so it is
    /// gone once the copy lands.
    pub fn restore_backup(&self, name: &str) -> Result<()> {
        if !is_bare_file_name(name) || !name.starts_with(&self.backup_prefix()) {
            return Err(StoreError::InvalidFileName {
                name: name.to_string(),
            });
        }

        let source = self.backup_dir.join(name);
        if !source.exists() {
            return Err(StoreError::BackupNotFound {
                name: name.to_string(),
            });
        }

        fs::copy(&source, &self.workbook_path)?;
        info!(backup = %name, "workbook restored from backup");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> StoreConfig {
        StoreConfig::new(dir.join("plantilla.xlsx"))
    }

    fn seed_workbook(config: &StoreConfig, contents: &str) {
        fs::write(&config.workbook_path, contents).unwrap();
    }

    fn at(secs: u32, millis: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, secs)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(i64::from(millis)))
            .unwrap()
    }

    #[test]
    fn test_timestamp_token_is_filesystem_safe() {
        let token = timestamp_token(at(5, 123));
        assert_eq!(token, "2025-03-14T09-30-05-123Z");
        assert!(!token.contains(':'));
        assert!(!token.contains('.'));
    }

    #[test]
    fn test_is_bare_file_name() {
        assert!(is_bare_file_name("plantilla_backup_x.xlsx"));
        assert!(!is_bare_file_name(""));
        assert!(!is_bare_file_name("a/b.xlsx"));
        assert!(!is_bare_file_name("../escape.xlsx"));
        assert!(!is_bare_file_name("/etc/passwd"));
    }

    #[test]
    fn test_create_backup_names_and_copies() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        seed_workbook(&config, "contenido");

        let manager = BackupManager::new(&config);
        let info = manager.create_backup_at(at(5, 0)).unwrap();

        assert_eq!(info.name, "plantilla_backup_2025-03-14T09-30-05-000Z.xlsx");
        let copied = fs::read_to_string(config.backup_dir.join(&info.name)).unwrap();
        assert_eq!(copied, "contenido");
        assert_eq!(info.size, "contenido".len() as u64);
    }

    #[test]
    fn test_create_backup_requires_live_workbook() {
        let dir = tempdir().unwrap();
        let manager = BackupManager::new(&config_in(dir.path()));

        assert!(matches!(
            manager.create_backup(),
            Err(StoreError::WorkbookNotFound { .. })
        ));
    }

    #[test]
    fn test_retention_keeps_ten_newest_of_twelve() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        seed_workbook(&config, "x");

        let manager = BackupManager::new(&config);
        for i in 0..12 {
            manager.create_backup_at(at(i, 0)).unwrap();
        }

        let names = manager.backup_file_names().unwrap();
        assert_eq!(names.len(), 10);
        // The two oldest are gone
        for i in 0..2u32 {
            assert!(
                !names.iter().any(|n| n.contains(&format!("09-30-0{i}-"))),
                "backup for second {i} should be pruned"
            );
        }
        assert!(names.iter().any(|n| n.contains("09-30-11-")));
    }

    #[test]
    fn test_same_instant_overwrites_rather_than_duplicates() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        seed_workbook(&config, "x");

        let manager = BackupManager::new(&config);
        manager.create_backup_at(at(5, 500)).unwrap();
        manager.create_backup_at(at(5, 500)).unwrap();

        assert_eq!(manager.backup_file_names().unwrap().len(), 1);
    }

    #[test]
    fn test_list_backups_newest_first() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        seed_workbook(&config, "x");

        let manager = BackupManager::new(&config);
        manager.create_backup_at(at(1, 0)).unwrap();
        manager.create_backup_at(at(2, 0)).unwrap();

        let listed = manager.list_backups().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].name.contains("09-30-02-"));
        assert!(listed[1].name.contains("09-30-01-"));
    }

    #[test]
    fn test_list_backups_without_directory_is_empty() {
        let dir = tempdir().unwrap();
        let manager = BackupManager::new(&config_in(dir.path()));
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_restore_replaces_live_file_byte_for_byte() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        seed_workbook(&config, "original");

        let manager = BackupManager::new(&config);
        let info = manager.create_backup_at(at(5, 0)).unwrap();

        seed_workbook(&config, "modificado");
        manager.restore_backup(&info.name).unwrap();

        assert_eq!(
            fs::read_to_string(&config.workbook_path).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_restore_rejects_traversal_and_foreign_names() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        seed_workbook(&config, "x");
        let manager = BackupManager::new(&config);

        assert!(matches!(
            manager.restore_backup("../plantilla.xlsx"),
            Err(StoreError::InvalidFileName { .. })
        ));
        // A bare name without the backup prefix is foreign to this store
        assert!(matches!(
            manager.restore_backup("otro.xlsx"),
            Err(StoreError::InvalidFileName { .. })
        ));
    }

    #[test]
    fn test_restore_unknown_backup_is_not_found() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        seed_workbook(&config, "x");
        let manager = BackupManager::new(&config);

        assert!(matches!(
            manager.restore_backup("plantilla_backup_2020-01-01T00-00-00-000Z.xlsx"),
            Err(StoreError::BackupNotFound { .. })
        ));
    }
}
