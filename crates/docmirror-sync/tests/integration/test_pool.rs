//! Transfer pool concurrency and task isolation

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use docmirror_core::domain::newtypes::{DestinationKey, FileId, VersionToken};
use docmirror_core::ports::object_store::IObjectStore;
use docmirror_core::ports::source_store::ISourceStore;
use docmirror_sync::pool::{TransferContext, TransferKind, TransferPool, TransferTask};
use docmirror_sync::retry::RetryPolicy;
use docmirror_sync::SyncError;

use crate::common::{engine_with, FakeSource, FakeStore, ROOT};

fn context(source: &Arc<FakeSource>, store: &Arc<FakeStore>) -> Arc<TransferContext> {
    let source: Arc<dyn ISourceStore> = source.clone();
    let destination: Arc<dyn IObjectStore> = store.clone();
    Arc::new(TransferContext {
        source,
        destination,
        retry: RetryPolicy::new(1, Duration::ZERO),
    })
}

fn task(id: &str, key: &str) -> TransferTask {
    TransferTask {
        file_id: FileId::new(id).unwrap(),
        version: VersionToken::new("v1").unwrap(),
        key: DestinationKey::new(key),
        kind: TransferKind::Create,
    }
}

#[tokio::test(start_paused = true)]
async fn test_never_more_than_max_workers_in_flight() {
    let source = Arc::new(FakeSource::new());
    for i in 0..12 {
        source.add_file(ROOT, &format!("d{i}"), &format!("file-{i}.bin"), "v1", b"payload");
    }
    let store = Arc::new(FakeStore::new());
    store.set_put_delay(Duration::from_millis(50));

    let summary = engine_with(&source, &store, "", |o| o.max_workers = 3)
        .sync()
        .await
        .unwrap();

    assert_eq!(summary.files_created, 12);
    let max = store.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "saw {max} concurrent transfers");
    assert!(max >= 2, "transfers never overlapped");
}

#[tokio::test(start_paused = true)]
async fn test_submit_waits_for_free_worker() {
    let source = Arc::new(FakeSource::new());
    source.add_file(ROOT, "d1", "a", "v1", b"a");
    source.add_file(ROOT, "d2", "b", "v1", b"b");
    let store = Arc::new(FakeStore::new());
    store.set_put_delay(Duration::from_secs(10));

    let mut pool = TransferPool::new(context(&source, &store), 1);
    pool.submit(task("d1", "a")).await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(pool.in_flight(), 1);

    let started = tokio::time::Instant::now();
    pool.submit(task("d2", "b")).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(pool.submitted(), 2);

    let outcomes = pool.drain().await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
}

#[tokio::test]
async fn test_panicking_task_is_reported_as_failure() {
    let source = Arc::new(FakeSource::new());
    source.add_file(ROOT, "d1", "boom", "v1", b"x");
    source.add_file(ROOT, "d2", "fine", "v1", b"y");
    source.panic_on_open("d1");
    let store = Arc::new(FakeStore::new());

    let mut pool = TransferPool::new(context(&source, &store), 2);
    pool.submit(task("d1", "boom")).await.unwrap();
    pool.submit(task("d2", "fine")).await.unwrap();
    let mut outcomes = pool.drain().await;
    outcomes.sort_by(|a, b| a.key.cmp(&b.key));

    assert_eq!(outcomes.len(), 2);
    match &outcomes[0].result {
        Err(SyncError::Transfer { key, cause }) => {
            assert_eq!(key.as_str(), "boom");
            assert!(cause.to_string().contains("panicked"));
        }
        other => panic!("expected Transfer error, got {other:?}"),
    }
    assert!(outcomes[1].is_success());
    assert!(store.get("fine").is_some());
}

#[tokio::test]
async fn test_fetch_handle_error_carries_attempts() {
    let source = Arc::new(FakeSource::new());
    source.add_file(ROOT, "d1", "a", "v1", b"a");
    source.fail_handle("d1", 1);
    let store = Arc::new(FakeStore::new());

    let mut pool = TransferPool::new(context(&source, &store), 1);
    pool.submit(task("d1", "a")).await.unwrap();
    let outcomes = pool.drain().await;

    match &outcomes[0].result {
        Err(SyncError::FetchHandle { file_id, attempts, .. }) => {
            assert_eq!(file_id.as_str(), "d1");
            assert_eq!(*attempts, 1);
        }
        other => panic!("expected FetchHandle error, got {other:?}"),
    }
}
