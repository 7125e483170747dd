//! Reconciliation runs over the WorkDocs adapter
//!
//! An unreadable listing entry must end the run as failed with the
//! destination untouched; a readable tree still reconciles normally.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docmirror_core::domain::newtypes::FolderId;
use docmirror_core::domain::phase::RunPhase;
use docmirror_sync::path::PathMapper;
use docmirror_sync::retry::RetryPolicy;
use docmirror_sync::{EngineOptions, ReconciliationEngine};

use crate::common::{self, MemoryStore};

fn engine(server: &MockServer, store: Arc<MemoryStore>) -> ReconciliationEngine {
    let mut options = EngineOptions::new(FolderId::new("root-1").unwrap());
    options.max_workers = 2;
    options.retry = RetryPolicy::new(1, Duration::from_millis(1));
    ReconciliationEngine::new(
        Arc::new(common::workdocs_source(server)),
        store,
        PathMapper::new(""),
        options,
    )
}

#[tokio::test]
async fn test_unreadable_entries_fail_run_without_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/folders/root-1/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Folders": [ { "Id": "folder-a" } ],
            "Documents": [ { "Id": "doc-1" } ]
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::default());
    store.seed("report.pdf", Some("ver-1"));
    store.seed("Reports/", None);
    store.seed("Reports/q1.xlsx", Some("ver-3"));

    let summary = engine(&server, Arc::clone(&store)).sync().await.unwrap();

    assert_eq!(summary.phase, RunPhase::Failed);
    assert!(summary.fatal_error.is_some());
    assert!(store.deletes().is_empty());
    assert_eq!(store.keys(), vec!["Reports/", "Reports/q1.xlsx", "report.pdf"]);
}

#[tokio::test]
async fn test_readable_listing_deletes_only_strays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/folders/root-1/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Folders": [],
            "Documents": [
                {
                    "Id": "doc-1",
                    "LatestVersionMetadata": { "Id": "ver-1", "Name": "report.pdf" }
                }
            ]
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::default());
    store.seed("report.pdf", Some("ver-1"));
    store.seed("old.txt", Some("ver-9"));

    let summary = engine(&server, Arc::clone(&store)).sync().await.unwrap();

    assert_eq!(summary.phase, RunPhase::Done);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.files_transferred(), 0);
    assert_eq!(store.deletes(), vec!["old.txt"]);
}
