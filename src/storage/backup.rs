//! JSON backups on local disk
//!
//! Handles scheduled and manual exports of the quote collection into a
//! backup directory, retention of old backup files, and reading backup
//! files back for import.

use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::codec::{self, ExportDocument, ImportPreview};
use crate::config::BackupConfig;
use crate::error::AppError;
use crate::metrics::BACKUPS_TOTAL;
use crate::service::QuoteStore;

/// Write `contents` next to `path` and rename it into place.
fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Date encoded in a backup file name, if it is one of ours
fn parse_backup_date(file_name: &str, prefix: &str) -> Option<NaiveDate> {
    let date = file_name
        .strip_prefix(prefix)?
        .strip_prefix("-backup-")?
        .strip_suffix(".json")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Backup service for the quote collection
///
/// Periodically exports the collection to a directory.
/// Keeps at most `retention_count` backup files.
pub struct BackupService {
    store: Arc<QuoteStore>,
    /// Directory holding backup files
    directory: PathBuf,
    /// Application name at the start of each file name
    file_prefix: String,
    /// Backup interval
    interval: Duration,
    /// Number of backups to retain
    retention_count: usize,
}

/// Backup metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Date from the file name
    pub date: NaiveDate,
}

impl BackupService {
    /// Create new backup service
    ///
    /// # Errors
    /// Returns error if the backup directory cannot be created
    pub async fn new(config: &BackupConfig, store: Arc<QuoteStore>) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.directory)
            .await
            .inspect_err(|e| {
                tracing::error!(err = ?e, path = %config.directory.display(), "an error occurred when creating backup directory");
            })?;

        Ok(Self {
            store,
            directory: config.directory.clone(),
            file_prefix: config.file_prefix.clone(),
            interval: Duration::from_secs(config.interval_seconds),
            retention_count: config.retention_count,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Start the backup scheduler
    ///
    /// Runs in background, performs backups at configured interval.
    /// First backup runs immediately on start.
    ///
    /// # Note
    /// This method runs indefinitely. Call in a spawned task.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            if let Err(error) = self.backup_now().await {
                tracing::error!(%error, "Scheduled backup failed");
            }
        }
    }

    /// Perform a backup now
    ///
    /// # Returns
    /// Path of the written file, or `None` if there was nothing to export
    ///
    /// # Steps
    /// 1. Export the collection
    /// 2. Write the file atomically (same-day backups replace each other)
    /// 3. Delete backups beyond the retention count
    pub async fn backup_now(&self) -> Result<Option<PathBuf>, AppError> {
        tracing::info!("Starting quote backup...");

        let result = self.write_backup().await;
        let status = match &result {
            Ok(Some(_)) => "success",
            Ok(None) => "skipped",
            Err(_) => "error",
        };
        BACKUPS_TOTAL.with_label_values(&[status]).inc();

        let Some(path) = result.map_err(|e| e.record("backup"))? else {
            tracing::info!("Collection is empty; backup skipped");
            return Ok(None);
        };

        if let Err(e) = self.cleanup_old_backups().await {
            tracing::warn!(error = %e, "Failed to cleanup old backups");
        }

        tracing::info!(path = %path.display(), "Backup completed successfully");
        Ok(Some(path))
    }

    async fn write_backup(&self) -> Result<Option<PathBuf>, AppError> {
        let Some(ExportDocument {
            file_name,
            contents,
            count,
        }) = codec::export_all(&self.store, &self.file_prefix).await?
        else {
            return Ok(None);
        };

        let path = self.directory.join(file_name);
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, contents.as_bytes()))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        tracing::debug!(count, path = %path.display(), "Backup file written");
        Ok(Some(path))
    }

    /// List all backups
    ///
    /// # Returns
    /// List of backup info, sorted by date descending
    pub async fn list_backups(&self) -> Result<Vec<BackupInfo>, AppError> {
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        let mut backups = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(date) = file_name
                .to_str()
                .and_then(|name| parse_backup_date(name, &self.file_prefix))
            else {
                continue;
            };

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            backups.push(BackupInfo {
                path: entry.path(),
                size: metadata.len(),
                date,
            });
        }

        // Sort by date descending
        backups.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(backups)
    }

    /// Delete old backups beyond retention count
    ///
    /// Keeps the most recent `retention_count` backups.
    async fn cleanup_old_backups(&self) -> Result<(), AppError> {
        let backups = self.list_backups().await?;

        if backups.len() > self.retention_count {
            for backup in &backups[self.retention_count..] {
                tracing::info!(path = %backup.path.display(), "Deleting old backup");
                tokio::fs::remove_file(&backup.path).await?;
            }
        }

        Ok(())
    }

    /// Read a backup (or any export) file for import
    ///
    /// # Errors
    /// - `AppError::Io` if the file cannot be read
    /// - `AppError::MalformedDocument` if it is not UTF-8 JSON
    pub async fn import_file(&self, path: &Path) -> Result<ImportPreview, AppError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                AppError::MalformedDocument(format!("{}: {}", path.display(), e))
            } else {
                AppError::Io(e)
            }
        })?;

        codec::prepare_import(&raw)
    }

    /// Import preview of the most recent backup, if any
    pub async fn latest_backup(&self) -> Result<Option<ImportPreview>, AppError> {
        match self.list_backups().await?.first() {
            Some(backup) => self.import_file(&backup.path).await.map(Some),
            None => Ok(None),
        }
    }
}
