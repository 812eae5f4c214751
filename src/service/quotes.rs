//! Quote store
//!
//! Owns the quote collection. Every mutation goes through here, is
//! persisted in SQLite and then republished as a full ordered snapshot
//! to every subscriber.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::Instrument;

use crate::data::{Database, NewQuote, Quote};
use crate::error::AppError;
use crate::metrics::{
    QUOTES_CREATED_TOTAL, QUOTES_DELETED_TOTAL, QUOTES_STORED, SNAPSHOT_SUBSCRIBERS,
};

/// Full ordered collection at one point in time
pub type Snapshot = Arc<Vec<Quote>>;

/// Stream of snapshots, starting with the current one
pub type SnapshotStream = WatchStream<Snapshot>;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Quote store
///
/// Construct one per database and share it behind an `Arc`.
/// Writes are serialized so that snapshots are published in the same
/// order the writes were applied. A write runs on its own task together
/// with the snapshot refresh, so dropping the caller's future does not
/// leave subscribers behind the database.
pub struct QuoteStore {
    db: Arc<Database>,
    snapshots: Arc<watch::Sender<Snapshot>>,
    write_lock: Arc<Mutex<()>>,
}

impl QuoteStore {
    /// Create the store and load the initial snapshot
    ///
    /// # Errors
    /// Returns `AppError::Persistence` if the collection cannot be read
    pub async fn new(db: Arc<Database>) -> Result<Self, AppError> {
        let quotes = db.get_all_quotes().await.inspect_err(|e| {
            tracing::error!(err = ?e, "an error occurred when loading quotes");
        })?;

        tracing::info!(count = quotes.len(), "Quote store initialized");
        QUOTES_STORED.set(quotes.len() as i64);

        let (snapshots, _) = watch::channel(Arc::new(quotes));

        Ok(Self {
            db,
            snapshots: Arc::new(snapshots),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Create a quote
    ///
    /// Text and author are trimmed; a blank author becomes "Unknown".
    /// The store assigns `id` and `created_at`.
    ///
    /// # Errors
    /// - `AppError::Validation` if the text is blank
    /// - `AppError::Persistence` if the write fails
    #[tracing::instrument(skip(self, quote), fields(theme = %quote.theme))]
    pub async fn create(&self, quote: NewQuote) -> Result<Quote, AppError> {
        let quote = quote.normalize().map_err(|e| e.record("create"))?;

        self.write("create", move |db| async move {
            let stored = db
                .insert_quote(&quote, now_millis())
                .await
                .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when adding quote"))?;

            QUOTES_CREATED_TOTAL.inc();
            tracing::info!(quote_id = stored.id, "Quote created");
            Ok::<_, AppError>(stored)
        })
        .await
    }

    /// Delete a quote by id
    ///
    /// Deleting an id that does not exist is not an error.
    ///
    /// # Returns
    /// `true` if a quote was removed
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        self.write("delete", move |db| async move {
            let removed = db.delete_quote(id).await.inspect_err(|e| {
                tracing::error!(err = ?e, "an error occurred when deleting quote");
            })?;

            if removed {
                QUOTES_DELETED_TOTAL.inc();
                tracing::info!(quote_id = id, "Quote deleted");
            } else {
                tracing::debug!(quote_id = id, "Quote to delete does not exist");
            }
            Ok::<_, AppError>(removed)
        })
        .await
    }

    /// Create many quotes in one transaction
    ///
    /// Every record gets a fresh id. A record's own `created_at` is kept,
    /// otherwise all records share the current time. Nothing is written
    /// unless every record is valid and the whole batch commits.
    ///
    /// # Returns
    /// The stored quotes, in input order
    #[tracing::instrument(skip_all, fields(count = records.len()))]
    pub async fn bulk_create(&self, records: Vec<NewQuote>) -> Result<Vec<Quote>, AppError> {
        let records = records
            .into_iter()
            .map(NewQuote::normalize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.record("bulk_create"))?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        self.write("bulk_create", move |db| async move {
            let now = now_millis();
            let ids = db.insert_quotes(&records, now).await.inspect_err(|e| {
                tracing::error!(err = ?e, count = records.len(), "an error occurred when adding quotes");
            })?;

            let stored: Vec<Quote> = records
                .into_iter()
                .zip(ids)
                .map(|(record, id)| Quote {
                    id,
                    created_at: record.created_at.unwrap_or(now),
                    text: record.text,
                    author: record.author,
                    theme: record.theme,
                })
                .collect();

            tracing::info!(count = stored.len(), "Quotes created in bulk");
            Ok::<_, AppError>(stored)
        })
        .await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// One-shot read of the whole collection, newest first
    pub async fn all(&self) -> Result<Vec<Quote>, AppError> {
        self.db
            .get_all_quotes()
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when fetching quotes"))
    }

    /// Get a single quote
    pub async fn get(&self, id: i64) -> Result<Option<Quote>, AppError> {
        self.db.get_quote(id).await
    }

    /// Number of stored quotes
    pub async fn count(&self) -> Result<i64, AppError> {
        self.db.count_quotes().await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.subscriber_count();
        self.snapshots.borrow().clone()
    }

    /// Number of live snapshot streams
    pub fn subscriber_count(&self) -> usize {
        let count = self.snapshots.receiver_count();
        SNAPSHOT_SUBSCRIBERS.set(count as i64);
        count
    }

    /// Subscribe to the collection
    ///
    /// The stream yields the current snapshot first, then a new one after
    /// every change. It only ends when the store is dropped. Snapshots
    /// published while the subscriber is not polling are coalesced into
    /// the latest one.
    pub fn subscribe_all(&self) -> SnapshotStream {
        let receiver = self.snapshots.subscribe();
        self.subscriber_count();
        WatchStream::new(receiver)
    }

    /// Run `operation` under the write lock on a spawned task, then
    /// republish the collection if it changed.
    ///
    /// The task finishes even when the returned future is dropped.
    /// Nothing is published when `operation` fails.
    async fn write<T, F, Fut>(&self, name: &'static str, operation: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Database>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let db = self.db.clone();
        let snapshots = self.snapshots.clone();
        let write_lock = self.write_lock.clone();

        let task = tokio::spawn(
            async move {
                let _guard = write_lock.lock().await;
                let output = operation(db.clone()).await.map_err(|e| e.record(name))?;
                publish(&db, &snapshots).await;
                Ok::<_, AppError>(output)
            }
            .in_current_span(),
        );

        task.await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("{name} task failed: {e}")).record(name))?
    }
}

/// Reload the collection and send it to subscribers if it differs from
/// the current snapshot.
///
/// Callers must hold `write_lock`. A failed reload keeps the previous
/// snapshot; the next successful write brings it back in line.
async fn publish(db: &Database, snapshots: &watch::Sender<Snapshot>) {
    let quotes = match db.get_all_quotes().await {
        Ok(quotes) => quotes,
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when refreshing snapshot");
            return;
        }
    };

    QUOTES_STORED.set(quotes.len() as i64);
    SNAPSHOT_SUBSCRIBERS.set(snapshots.receiver_count() as i64);
    snapshots.send_if_modified(|current| {
        if **current == quotes {
            return false;
        }
        *current = Arc::new(quotes);
        true
    });
}
