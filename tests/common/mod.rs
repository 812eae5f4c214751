//! Common test utilities for E2E tests

#![allow(dead_code)]

use kinetic_quotes::{App, config};
use std::path::PathBuf;
use tempfile::TempDir;

/// Test application instance
pub struct TestApp {
    pub app: App,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Create a new app on a fresh temporary database
    pub async fn new() -> Self {
        Self::with_retention(7).await
    }

    /// Create a new app keeping at most `retention_count` backups
    pub async fn with_retention(retention_count: usize) -> Self {
        let temp_dir = TempDir::new().unwrap();

        let config = config::AppConfig {
            database: config::DatabaseConfig {
                path: temp_dir.path().join("test.db"),
            },
            backup: config::BackupConfig {
                enabled: false,
                directory: temp_dir.path().join("backups"),
                interval_seconds: 86400,
                retention_count,
                file_prefix: "kinetic-quotes".to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let app = App::new(config).await.unwrap();

        Self {
            app,
            _temp_dir: temp_dir,
        }
    }

    pub fn backup_dir(&self) -> PathBuf {
        self._temp_dir.path().join("backups")
    }

    /// (text, author, theme) triples, sorted, for multiset comparison
    pub async fn triples(&self) -> Vec<(String, String, String)> {
        let mut triples: Vec<_> = self
            .app
            .store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|quote| (quote.text, quote.author, quote.theme.to_string()))
            .collect();
        triples.sort();
        triples
    }
}
