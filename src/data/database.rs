//! SQLite database operations
//!
//! All access to the `quotes` table goes through this module.
//! Uses SQLx with embedded migrations.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use std::time::Instant;

use super::models::*;
use crate::error::AppError;

/// Canonical read order: newest first, later insert wins a timestamp tie.
const SELECT_ALL_QUOTES: &str =
    "SELECT id, text, author, theme, created_at FROM quotes ORDER BY created_at DESC, id DESC";

fn observe<T>(operation: &str, started: Instant, result: &Result<T, sqlx::Error>) {
    let status = if result.is_ok() { "success" } else { "error" };
    crate::metrics::observe_db_query(operation, status, started.elapsed());
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Persistence(sqlx::Error::Io(e)))?;
            }
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    /// Insert one already-normalized quote
    ///
    /// # Returns
    /// The stored quote with its assigned id
    pub async fn insert_quote(&self, quote: &NewQuote, created_at: i64) -> Result<Quote, AppError> {
        let started = Instant::now();
        let result = sqlx::query(
            "INSERT INTO quotes (text, author, theme, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&quote.text)
        .bind(&quote.author)
        .bind(quote.theme.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await;
        observe("insert_quote", started, &result);

        Ok(Quote {
            id: result?.last_insert_rowid(),
            text: quote.text.clone(),
            author: quote.author.clone(),
            created_at,
            theme: quote.theme,
        })
    }

    /// Insert many already-normalized quotes in one transaction
    ///
    /// Either every row is written or none is. Rows without their own
    /// `created_at` get `default_created_at`.
    ///
    /// # Returns
    /// Assigned ids, in input order
    pub async fn insert_quotes(
        &self,
        quotes: &[NewQuote],
        default_created_at: i64,
    ) -> Result<Vec<i64>, AppError> {
        let started = Instant::now();
        let result = async {
            let mut tx = self.pool.begin().await?;
            let mut ids = Vec::with_capacity(quotes.len());

            for quote in quotes {
                let row = sqlx::query(
                    "INSERT INTO quotes (text, author, theme, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(&quote.text)
                .bind(&quote.author)
                .bind(quote.theme.as_str())
                .bind(quote.created_at.unwrap_or(default_created_at))
                .execute(&mut *tx)
                .await?;
                ids.push(row.last_insert_rowid());
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>(ids)
        }
        .await;
        observe("insert_quotes", started, &result);

        Ok(result?)
    }

    /// Delete a quote by id
    ///
    /// # Returns
    /// `true` if a row was removed
    pub async fn delete_quote(&self, id: i64) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = sqlx::query("DELETE FROM quotes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await;
        observe("delete_quote", started, &result);

        Ok(result?.rows_affected() > 0)
    }

    /// Get a quote by id
    pub async fn get_quote(&self, id: i64) -> Result<Option<Quote>, AppError> {
        let started = Instant::now();
        let result = sqlx::query_as::<_, QuoteRow>(
            "SELECT id, text, author, theme, created_at FROM quotes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        observe("get_quote", started, &result);

        result?.map(Quote::try_from).transpose()
    }

    /// Get every quote, newest first
    pub async fn get_all_quotes(&self) -> Result<Vec<Quote>, AppError> {
        let started = Instant::now();
        let result = sqlx::query_as::<_, QuoteRow>(SELECT_ALL_QUOTES)
            .fetch_all(&self.pool)
            .await;
        observe("get_all_quotes", started, &result);

        result?.into_iter().map(Quote::try_from).collect()
    }

    /// Count stored quotes
    pub async fn count_quotes(&self) -> Result<i64, AppError> {
        let started = Instant::now();
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quotes")
            .fetch_one(&self.pool)
            .await;
        observe("count_quotes", started, &result);

        Ok(result?)
    }
}
