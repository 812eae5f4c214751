//! Kinetic Quotes - a personal, local quote collection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │               Presentation layer (external)                  │
//! │  - renders snapshots, collects new-quote input               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - QuoteStore: create / delete / bulk create                 │
//! │  - reactive snapshots (tokio watch)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌───────────────────────────────┬─────────────────────────────┐
//! │          Data Layer           │          Storage            │
//! │  - SQLite (sqlx)              │  - JSON export / import     │
//! │                               │  - backup files on disk     │
//! └───────────────────────────────┴─────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `data`: SQLite access and models
//! - `service`: the quote store
//! - `storage`: export/import codec and backups
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

pub use data::{NewQuote, Quote, Theme};
pub use error::AppError;
pub use service::QuoteStore;

/// Application state
///
/// Built once at startup and handed to whatever presents the collection.
/// Cloning is cheap.
#[derive(Clone)]
pub struct App {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Quote store (sole writer of the collection)
    pub store: Arc<QuoteStore>,

    /// Backup service
    pub backup: Arc<storage::BackupService>,
}

impl App {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Load the quote store
    /// 3. Prepare the backup directory
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        // 2. Load the quote store
        let store = Arc::new(QuoteStore::new(Arc::new(db)).await?);

        // 3. Initialize backup service
        let backup = storage::BackupService::new(&config.backup, store.clone()).await?;
        tracing::info!(directory = %backup.directory().display(), "Backup service initialized");

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            store,
            backup: Arc::new(backup),
        })
    }

    /// Export the collection using the configured file prefix
    pub async fn export(&self) -> Result<Option<storage::ExportDocument>, AppError> {
        storage::export_all(&self.store, &self.config.backup.file_prefix).await
    }

    /// Import a JSON document after `confirm` accepts the preview
    pub async fn import(
        &self,
        raw: &str,
        confirm: impl FnOnce(&storage::ImportPreview) -> bool,
    ) -> Result<Option<storage::ImportReport>, AppError> {
        storage::import_document(&self.store, raw, confirm).await
    }
}
