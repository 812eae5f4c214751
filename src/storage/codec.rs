//! JSON export/import of the quote collection
//!
//! Export writes the whole collection as a pretty-printed array.
//! Import is two-phase: [`prepare_import`] parses and filters a document
//! without touching the store, then [`ImportPreview::apply`] writes the
//! accepted records once the caller has confirmed the count.

use chrono::NaiveDate;
use serde_json::Value;

use crate::data::{NewQuote, Quote, Theme};
use crate::error::AppError;
use crate::metrics::QUOTES_IMPORTED_TOTAL;
use crate::service::QuoteStore;

/// Default application name used in backup file names
pub const DEFAULT_FILE_PREFIX: &str = "kinetic-quotes";

/// `<prefix>-backup-<YYYY-MM-DD>.json`
pub fn backup_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-backup-{}.json", prefix, date.format("%Y-%m-%d"))
}

/// Serialized export, ready to be written out
#[derive(Debug, Clone)]
pub struct ExportDocument {
    /// Suggested file name
    pub file_name: String,
    /// Pretty-printed JSON array
    pub contents: String,
    /// Number of quotes in the document
    pub count: usize,
}

/// Serialize quotes as a pretty-printed JSON array.
pub fn encode_quotes(quotes: &[Quote]) -> Result<String, AppError> {
    serde_json::to_string_pretty(quotes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode quotes: {e}")))
}

/// Export the whole collection
///
/// Reads the store once (not the snapshot stream).
///
/// # Returns
/// `None` when the collection is empty
pub async fn export_all(
    store: &QuoteStore,
    file_prefix: &str,
) -> Result<Option<ExportDocument>, AppError> {
    let quotes = store.all().await?;
    if quotes.is_empty() {
        tracing::debug!("nothing to export");
        return Ok(None);
    }

    let contents = encode_quotes(&quotes)?;
    let file_name = backup_file_name(file_prefix, chrono::Utc::now().date_naive());
    tracing::info!(count = quotes.len(), file_name = %file_name, "Exported quotes");

    Ok(Some(ExportDocument {
        file_name,
        contents,
        count: quotes.len(),
    }))
}

// =============================================================================
// Import
// =============================================================================

/// Records accepted from an import document, not yet written
#[derive(Debug, Clone, Default)]
pub struct ImportPreview {
    records: Vec<NewQuote>,
    skipped: usize,
}

/// Outcome of a confirmed import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

impl ImportPreview {
    /// Number of records that would be imported
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of elements dropped by validation
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn records(&self) -> &[NewQuote] {
        &self.records
    }

    /// Write the accepted records through the store's bulk create
    ///
    /// Records are inserted last to first, so quotes sharing a timestamp
    /// come out of the snapshot in document order.
    ///
    /// # Errors
    /// `AppError::Persistence` if the batch could not be stored;
    /// nothing is imported in that case
    pub async fn apply(self, store: &QuoteStore) -> Result<ImportReport, AppError> {
        let skipped = self.skipped;
        let mut records = self.records;
        records.reverse();
        let stored = store.bulk_create(records).await?;

        QUOTES_IMPORTED_TOTAL
            .with_label_values(&["imported"])
            .inc_by(stored.len() as u64);
        tracing::info!(imported = stored.len(), skipped, "Import applied");

        Ok(ImportReport {
            imported: stored.len(),
            skipped,
        })
    }
}

fn non_blank_str<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// Validate one array element. Any `id` it carries is ignored.
fn parse_record(record: &Value) -> Option<NewQuote> {
    let text = non_blank_str(record, "text")?;
    let author = non_blank_str(record, "author")?;
    let theme = record.get("theme")?.as_str()?.parse::<Theme>().ok()?;

    let quote = NewQuote::new(text, author, theme);
    match record.get("createdAt").and_then(Value::as_i64) {
        Some(created_at) if created_at >= 0 => Some(quote.with_created_at(created_at)),
        _ => Some(quote),
    }
}

/// Parse and filter an import document
///
/// Elements need a non-blank `text` and `author` string and a known
/// `theme`; anything else is skipped. A document whose top level is not
/// an array imports nothing.
///
/// # Errors
/// `AppError::MalformedDocument` if `raw` is not valid JSON
pub fn prepare_import(raw: &str) -> Result<ImportPreview, AppError> {
    let document: Value = serde_json::from_str(raw)
        .inspect_err(|e| tracing::warn!(err = %e, "import document is not valid JSON"))
        .map_err(|e| AppError::MalformedDocument(e.to_string()).record("import"))?;

    let Value::Array(elements) = document else {
        tracing::warn!("import document is not an array; nothing to import");
        return Ok(ImportPreview::default());
    };

    let total = elements.len();
    let records: Vec<NewQuote> = elements.iter().filter_map(parse_record).collect();
    let skipped = total - records.len();

    QUOTES_IMPORTED_TOTAL
        .with_label_values(&["skipped"])
        .inc_by(skipped as u64);
    tracing::info!(accepted = records.len(), skipped, "Import document parsed");

    Ok(ImportPreview { records, skipped })
}

/// Parse a document, ask `confirm` with the preview, then import
///
/// # Returns
/// `None` if `confirm` declined
pub async fn import_document(
    store: &QuoteStore,
    raw: &str,
    confirm: impl FnOnce(&ImportPreview) -> bool,
) -> Result<Option<ImportReport>, AppError> {
    let preview = prepare_import(raw)?;

    if !confirm(&preview) {
        tracing::info!(accepted = preview.len(), "Import declined");
        return Ok(None);
    }

    preview.apply(store).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            backup_file_name(DEFAULT_FILE_PREFIX, date),
            "kinetic-quotes-backup-2024-03-09.json"
        );
    }

    #[test]
    fn encode_quotes_is_pretty_with_stable_keys() {
        let quotes = vec![Quote {
            id: 1,
            text: "A".to_string(),
            author: "B".to_string(),
            created_at: 5,
            theme: Theme::FadeUp,
        }];

        let encoded = encode_quotes(&quotes).unwrap();
        let expected = "[\n  {\n    \"id\": 1,\n    \"text\": \"A\",\n    \"author\": \"B\",\n    \"createdAt\": 5,\n    \"theme\": \"fade_up\"\n  }\n]";
        assert_eq!(encoded, expected);
    }

    #[test]
    fn prepare_import_filters_invalid_records_and_drops_ids() {
        let preview = prepare_import(
            r#"[{"text":"A","author":"B","theme":"fade_up","id":999},{"text":"","author":"C","theme":"drift"}]"#,
        )
        .unwrap();

        assert_eq!(preview.len(), 1);
        assert_eq!(preview.skipped(), 1);
        assert_eq!(preview.records()[0], NewQuote::new("A", "B", Theme::FadeUp));
    }

    #[test]
    fn prepare_import_rejects_wrong_shapes() {
        let preview = prepare_import(
            r#"[
                {"text":"ok","author":"a","theme":"shimmer"},
                {"text":"no author","theme":"drift"},
                {"text":"blank author","author":"  ","theme":"drift"},
                {"text":"bad theme","author":"a","theme":"sparkle"},
                {"text":42,"author":"a","theme":"drift"},
                "just a string",
                null
            ]"#,
        )
        .unwrap();

        assert_eq!(preview.len(), 1);
        assert_eq!(preview.skipped(), 6);
    }

    #[test]
    fn prepare_import_keeps_valid_created_at() {
        let preview = prepare_import(
            r#"[
                {"text":"kept","author":"a","theme":"drift","createdAt":1700000000000},
                {"text":"negative","author":"a","theme":"drift","createdAt":-5},
                {"text":"string","author":"a","theme":"drift","createdAt":"yesterday"}
            ]"#,
        )
        .unwrap();

        let created: Vec<Option<i64>> = preview.records().iter().map(|r| r.created_at).collect();
        assert_eq!(created, vec![Some(1_700_000_000_000), None, None]);
    }

    #[test]
    fn prepare_import_of_non_array_imports_nothing() {
        let preview = prepare_import(r#"{"text":"A","author":"B","theme":"drift"}"#).unwrap();
        assert!(preview.is_empty());
        assert_eq!(preview.skipped(), 0);
    }

    #[test]
    fn prepare_import_rejects_invalid_json() {
        let error = prepare_import("not json at all").unwrap_err();
        assert!(matches!(error, AppError::MalformedDocument(_)));
    }
}
