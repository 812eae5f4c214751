//! E2E tests for JSON export and import

mod common;

use common::TestApp;
use kinetic_quotes::storage::{self, ImportReport};
use kinetic_quotes::{AppError, NewQuote, Theme};
use serde_json::Value;

async fn seed(test: &TestApp) {
    let store = &test.app.store;
    store
        .create(NewQuote::new("Stay hungry, stay foolish.", "", Theme::Drift))
        .await
        .unwrap();
    store
        .create(NewQuote::new("Less is more.", "Mies", Theme::Shimmer))
        .await
        .unwrap();
    store
        .create(NewQuote::new("Less is more.", "Mies", Theme::Shimmer))
        .await
        .unwrap();
    store
        .create(NewQuote::new("Simplicity.", "Anon", Theme::Typewriter))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_export_of_empty_collection_is_nothing() {
    let test = TestApp::new().await;
    assert!(test.app.export().await.unwrap().is_none());
}

#[tokio::test]
async fn test_export_document_shape() {
    let test = TestApp::new().await;
    seed(&test).await;

    let document = test.app.export().await.unwrap().unwrap();
    assert_eq!(document.count, 4);
    assert!(document.file_name.starts_with("kinetic-quotes-backup-"));
    assert!(document.file_name.ends_with(".json"));

    let parsed: Value = serde_json::from_str(&document.contents).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 4);
    for item in items {
        let keys: Vec<&String> = item.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        assert!(item["id"].is_i64());
        assert!(item["createdAt"].is_i64());
        assert!(item["text"].is_string());
        assert!(item["author"].is_string());
        assert!(item["theme"].is_string());
    }

    // Newest first, like the snapshot
    assert_eq!(items[0]["text"], "Simplicity.");
    assert!(document.contents.contains("\n  {"));
}

#[tokio::test]
async fn test_export_then_import_into_fresh_store_keeps_triples() {
    let source = TestApp::new().await;
    seed(&source).await;
    let document = source.app.export().await.unwrap().unwrap();

    let target = TestApp::new().await;
    let report = target
        .app
        .import(&document.contents, |preview| preview.len() == 4)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report, ImportReport { imported: 4, skipped: 0 });
    assert_eq!(target.triples().await, source.triples().await);

    // Restored chronology matches the source
    let source_texts: Vec<String> = source.app.store.snapshot().iter().map(|q| q.text.clone()).collect();
    let target_texts: Vec<String> = target.app.store.snapshot().iter().map(|q| q.text.clone()).collect();
    assert_eq!(target_texts, source_texts);
}

#[tokio::test]
async fn test_import_reassigns_ids() {
    let test = TestApp::new().await;
    let existing = test
        .app
        .store
        .create(NewQuote::new("Existing", "Local", Theme::Drift))
        .await
        .unwrap();

    let raw = format!(
        r#"[{{"text":"A","author":"B","theme":"fade_up","id":999}},{{"text":"Clash","author":"C","theme":"drift","id":{}}},{{"text":"","author":"C","theme":"drift"}}]"#,
        existing.id
    );

    let report = test.app.import(&raw, |_| true).await.unwrap().unwrap();
    assert_eq!(report, ImportReport { imported: 2, skipped: 1 });

    let quotes = test.app.store.all().await.unwrap();
    assert_eq!(quotes.len(), 3);
    assert!(quotes.iter().all(|quote| quote.id != 999));
    let existing_id_count = quotes.iter().filter(|quote| quote.id == existing.id).count();
    assert_eq!(existing_id_count, 1);
}

#[tokio::test]
async fn test_import_scenario_single_valid_record() {
    let test = TestApp::new().await;
    let raw = r#"[{"text":"A","author":"B","theme":"fade_up","id":999},{"text":"","author":"C","theme":"drift"}]"#;

    let preview = storage::prepare_import(raw).unwrap();
    assert_eq!(preview.len(), 1);

    let report = preview.apply(&test.app.store).await.unwrap();
    assert_eq!(report.imported, 1);

    let quotes = test.app.store.all().await.unwrap();
    assert_eq!(quotes.len(), 1);
    assert_ne!(quotes[0].id, 999);
    assert_eq!(quotes[0].theme, Theme::FadeUp);
}

#[tokio::test]
async fn test_declined_import_writes_nothing() {
    let test = TestApp::new().await;
    let raw = r#"[{"text":"A","author":"B","theme":"drift"}]"#;

    let mut offered = 0;
    let outcome = test
        .app
        .import(raw, |preview| {
            offered = preview.len();
            false
        })
        .await
        .unwrap();

    assert!(outcome.is_none());
    assert_eq!(offered, 1);
    assert_eq!(test.app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_import_leaves_collection_unchanged() {
    let test = TestApp::new().await;
    seed(&test).await;
    let before = test.app.store.all().await.unwrap();

    let error = test
        .app
        .import("{ this is not json", |_| panic!("must not ask for confirmation"))
        .await
        .unwrap_err();

    assert!(matches!(error, AppError::MalformedDocument(_)));
    assert_eq!(test.app.store.all().await.unwrap(), before);
}

#[tokio::test]
async fn test_non_array_import_is_silently_empty() {
    let test = TestApp::new().await;

    let report = test
        .app
        .import(r#"{"quotes":[{"text":"A","author":"B","theme":"drift"}]}"#, |preview| {
            preview.is_empty()
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report, ImportReport { imported: 0, skipped: 0 });
    assert_eq!(test.app.store.count().await.unwrap(), 0);
}
