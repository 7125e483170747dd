//! End-to-end reconciliation scenarios

use std::sync::Arc;

use docmirror_core::domain::phase::RunPhase;

use crate::common::{engine, engine_with, FakeSource, FakeStore, ROOT};

fn single_document_tree() -> Arc<FakeSource> {
    let source = Arc::new(FakeSource::new());
    source.add_folder(ROOT, "fa", "A");
    source.add_file("fa", "d1", "doc.txt", "v1", b"first version");
    source
}

#[tokio::test]
async fn test_initial_sync_creates_placeholder_and_object() {
    let source = single_document_tree();
    let store = Arc::new(FakeStore::new());

    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.phase, RunPhase::Done);
    assert_eq!(summary.folders_ensured, 1);
    assert_eq!(summary.files_created, 1);
    assert_eq!(summary.files_updated, 0);
    assert_eq!(summary.objects_deleted, 0);
    assert!(summary.errors.is_empty());
    assert!(summary.finished_at.is_some());

    let placeholder = store.get("A/").unwrap();
    assert!(placeholder.data.is_empty());
    assert_eq!(placeholder.version, None);

    let doc = store.get("A/doc.txt").unwrap();
    assert_eq!(doc.data, b"first version");
    assert_eq!(doc.version.as_deref(), Some("v1"));
    assert!(store.deletes().is_empty());
}

#[tokio::test]
async fn test_stray_object_is_deleted_without_transfers() {
    let source = single_document_tree();
    let store = Arc::new(FakeStore::new());
    engine(&source, &store, "").sync().await.unwrap();

    store.seed("B/old.txt", b"orphan", Some("v9"));
    store.clear_log();

    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.phase, RunPhase::Done);
    assert_eq!(summary.files_transferred(), 0);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.objects_deleted, 1);
    assert_eq!(store.deletes(), vec!["B/old.txt".to_string()]);
    assert!(store.get("B/old.txt").is_none());
    assert!(store.get("A/doc.txt").is_some());
}

#[tokio::test]
async fn test_updated_version_is_retransferred() {
    let source = single_document_tree();
    let store = Arc::new(FakeStore::new());
    engine(&source, &store, "").sync().await.unwrap();

    source.update_file("d1", "v2", b"second version");
    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.files_updated, 1);
    assert_eq!(summary.files_created, 0);
    let doc = store.get("A/doc.txt").unwrap();
    assert_eq!(doc.version.as_deref(), Some("v2"));
    assert_eq!(doc.data, b"second version");
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let source = Arc::new(FakeSource::new());
    source.add_folder(ROOT, "fa", "A");
    source.add_folder("fa", "fb", "B");
    source.add_file(ROOT, "d0", "top.txt", "v1", b"top");
    source.add_file("fa", "d1", "one.txt", "v1", b"one");
    source.add_file("fb", "d2", "two.txt", "v3", b"two");
    let store = Arc::new(FakeStore::new());

    let first = engine(&source, &store, "mirror").sync().await.unwrap();
    assert_eq!(first.files_created, 3);
    let keys_after_first = store.keys();

    store.clear_log();
    let second = engine(&source, &store, "mirror").sync().await.unwrap();

    assert_eq!(second.phase, RunPhase::Done);
    assert_eq!(second.files_transferred(), 0);
    assert_eq!(second.files_skipped, 3);
    assert_eq!(second.objects_deleted, 0);
    assert!(store.deletes().is_empty());
    assert!(store.puts().iter().all(|key| key.ends_with('/')));
    assert_eq!(store.keys(), keys_after_first);
}

#[tokio::test]
async fn test_every_reachable_file_is_mirrored_with_pagination() {
    let source = Arc::new(FakeSource::with_page_size(2));
    source.add_folder(ROOT, "f1", "Reports");
    source.add_folder(ROOT, "f2", "Archive");
    source.add_folder("f2", "f3", "2023");
    for i in 0..5 {
        source.add_file(ROOT, &format!("r{i}"), &format!("root-{i}.txt"), "v1", b"r");
        source.add_file("f1", &format!("p{i}"), &format!("report-{i}.pdf"), "v1", b"p");
        source.add_file("f3", &format!("a{i}"), &format!("old-{i}.doc"), "v2", b"a");
    }
    let store = Arc::new(FakeStore::with_page_size(3));

    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.files_created, 15);
    assert_eq!(summary.folders_ensured, 3);
    for i in 0..5 {
        assert_eq!(
            store.get(&format!("root-{i}.txt")).unwrap().version.as_deref(),
            Some("v1")
        );
        assert!(store.get(&format!("Reports/report-{i}.pdf")).is_some());
        assert_eq!(
            store
                .get(&format!("Archive/2023/old-{i}.doc"))
                .unwrap()
                .version
                .as_deref(),
            Some("v2")
        );
    }
}

#[tokio::test]
async fn test_orphans_deleted_once_in_sorted_order() {
    let source = single_document_tree();
    source.add_file(ROOT, "d2", "keep.txt", "v1", b"keep");
    let store = Arc::new(FakeStore::with_page_size(2));
    store.seed("zeta.txt", b"", Some("v1"));
    store.seed("B/", b"", None);
    store.seed("B/old.txt", b"", Some("v1"));
    store.seed("A/gone.txt", b"", Some("v1"));

    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.objects_deleted, 4);
    assert_eq!(
        store.deletes(),
        vec![
            "A/gone.txt".to_string(),
            "B/".to_string(),
            "B/old.txt".to_string(),
            "zeta.txt".to_string(),
        ]
    );
    assert_eq!(
        store.keys(),
        vec!["A/".to_string(), "A/doc.txt".to_string(), "keep.txt".to_string()]
    );
}

#[tokio::test]
async fn test_removed_source_file_is_deleted() {
    let source = single_document_tree();
    source.add_file("fa", "d2", "temp.txt", "v1", b"temp");
    let store = Arc::new(FakeStore::new());
    engine(&source, &store, "").sync().await.unwrap();
    assert!(store.get("A/temp.txt").is_some());

    source.remove_file("d2");
    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.objects_deleted, 1);
    assert!(store.get("A/temp.txt").is_none());
    assert!(store.get("A/doc.txt").is_some());
}

#[tokio::test]
async fn test_prefix_scopes_baseline_and_keeps_prefix_placeholder() {
    let source = single_document_tree();
    let store = Arc::new(FakeStore::new());
    store.seed("backup/", b"", None);
    store.seed("backup/stale.txt", b"", Some("v1"));
    store.seed("other/unrelated.txt", b"", Some("v1"));

    let summary = engine(&source, &store, "/backup/").sync().await.unwrap();

    assert_eq!(summary.phase, RunPhase::Done);
    assert_eq!(store.deletes(), vec!["backup/stale.txt".to_string()]);
    assert!(store.get("backup/").is_some());
    assert!(store.get("other/unrelated.txt").is_some());
    assert_eq!(
        store.get("backup/A/doc.txt").unwrap().version.as_deref(),
        Some("v1")
    );
}

#[tokio::test]
async fn test_names_with_separator_map_to_escaped_keys() {
    let source = Arc::new(FakeSource::new());
    source.add_folder(ROOT, "fa", "Q1/Q2");
    source.add_file("fa", "d1", "50% off.txt", "v1", b"sale");
    source.add_file(ROOT, "d2", "Q1", "v1", b"plain");
    let store = Arc::new(FakeStore::new());

    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.files_created, 2);
    assert!(store.get("Q1%2FQ2/").is_some());
    assert!(store.get("Q1%2FQ2/50%25 off.txt").is_some());
    assert!(store.get("Q1").is_some());
}

#[tokio::test]
async fn test_object_without_version_metadata_is_replaced() {
    let source = single_document_tree();
    let store = Arc::new(FakeStore::new());
    store.seed("A/doc.txt", b"copied by hand", None);

    let summary = engine(&source, &store, "").sync().await.unwrap();

    assert_eq!(summary.files_updated, 1);
    assert_eq!(store.get("A/doc.txt").unwrap().data, b"first version");
}

#[tokio::test]
async fn test_dry_run_reports_plan_without_mutating() {
    let source = single_document_tree();
    source.add_file(ROOT, "d2", "changed.txt", "v2", b"new");
    let store = Arc::new(FakeStore::new());
    store.seed("changed.txt", b"old", Some("v1"));
    store.seed("stray.txt", b"", Some("v1"));

    let summary = engine_with(&source, &store, "", |o| o.dry_run = true)
        .sync()
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.phase, RunPhase::Done);
    assert_eq!(summary.folders_ensured, 1);
    assert_eq!(summary.files_created, 1);
    assert_eq!(summary.files_updated, 1);
    assert_eq!(summary.objects_deleted, 1);
    assert!(store.puts().is_empty());
    assert!(store.deletes().is_empty());
    assert_eq!(source.resolve_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(store.get("changed.txt").unwrap().data, b"old");
}

#[tokio::test]
async fn test_empty_source_deletes_everything_under_prefix() {
    let source = Arc::new(FakeSource::new());
    let store = Arc::new(FakeStore::new());
    store.seed("m/", b"", None);
    store.seed("m/a.txt", b"", Some("v1"));
    store.seed("m/B/", b"", None);

    let summary = engine(&source, &store, "m").sync().await.unwrap();

    assert_eq!(summary.phase, RunPhase::Done);
    assert_eq!(summary.objects_deleted, 2);
    assert_eq!(store.keys(), vec!["m/".to_string()]);
}
