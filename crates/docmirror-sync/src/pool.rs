//! Transfer worker pool
//!
//! Each submitted [`TransferTask`] runs on its own tokio task. A semaphore
//! with `max_workers` permits bounds how many run at once; [`TransferPool::submit`]
//! waits for a free permit, so a fast walk cannot queue unbounded work.
//!
//! A task resolves a fresh fetch handle (with retries), opens the content
//! stream and hands it to the destination together with the version-token
//! metadata. Failures stay inside the task and are reported by
//! [`TransferPool::drain`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, warn};

use docmirror_core::domain::newtypes::{DestinationKey, FileId, VersionToken};
use docmirror_core::ports::object_store::{IObjectStore, ObjectBody, ObjectMetadata};
use docmirror_core::ports::source_store::ISourceStore;

use crate::retry::RetryPolicy;
use crate::SyncError;

/// Whether a transfer fills a missing key or replaces a stale object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Create,
    Update,
}

/// One file version to copy to one destination key
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub file_id: FileId,
    pub version: VersionToken,
    pub key: DestinationKey,
    pub kind: TransferKind,
}

/// Terminal state of a submitted task
#[derive(Debug)]
pub struct TransferOutcome {
    pub key: DestinationKey,
    pub kind: TransferKind,
    pub result: Result<(), SyncError>,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Shared, immutable state every transfer task needs
pub struct TransferContext {
    pub source: Arc<dyn ISourceStore>,
    pub destination: Arc<dyn IObjectStore>,
    pub retry: RetryPolicy,
}

/// Bounded pool of transfer tasks
pub struct TransferPool {
    context: Arc<TransferContext>,
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    tasks: JoinSet<TransferOutcome>,
    pending: HashMap<task::Id, (DestinationKey, TransferKind)>,
    submitted: usize,
}

impl TransferPool {
    /// Create a pool running at most `max_workers` transfers at once
    pub fn new(context: Arc<TransferContext>, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            context,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            tasks: JoinSet::new(),
            pending: HashMap::new(),
            submitted: 0,
        }
    }

    /// Number of transfers currently holding a worker slot
    pub fn in_flight(&self) -> usize {
        self.max_workers - self.semaphore.available_permits()
    }

    /// Number of tasks submitted so far
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Submit a transfer, waiting while all workers are busy
    pub async fn submit(&mut self, task: TransferTask) -> Result<(), SyncError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SyncError::Cancelled)?;

        debug!(key = %task.key, kind = ?task.kind, "Submitting transfer");
        self.submitted += 1;
        let entry = (task.key.clone(), task.kind);

        let context = Arc::clone(&self.context);
        let handle = self.tasks.spawn(async move {
            let _permit = permit;
            let result = run_transfer(&context, &task).await;

            if let Err(err) = &result {
                warn!(key = %task.key, error = %err, "Transfer failed");
            }

            TransferOutcome {
                key: task.key,
                kind: task.kind,
                result,
            }
        });
        self.pending.insert(handle.id(), entry);

        Ok(())
    }

    /// Wait for every submitted task and return their outcomes
    ///
    /// A task that panicked or was cancelled still yields an outcome: a
    /// failure for the key it was transferring.
    pub async fn drain(mut self) -> Vec<TransferOutcome> {
        let mut outcomes = Vec::with_capacity(self.submitted);

        while let Some(joined) = self.tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    self.pending.remove(&id);
                    outcomes.push(outcome);
                }
                Err(join_err) => {
                    let Some((key, kind)) = self.pending.remove(&join_err.id()) else {
                        error!(error = %join_err, "Unknown transfer task did not complete");
                        continue;
                    };
                    let reason = if join_err.is_panic() {
                        "transfer task panicked"
                    } else {
                        "transfer task aborted"
                    };
                    error!(key = %key, error = %join_err, "{reason}");
                    outcomes.push(TransferOutcome {
                        result: Err(SyncError::Transfer {
                            key: key.clone(),
                            cause: anyhow::anyhow!(reason),
                        }),
                        key,
                        kind,
                    });
                }
            }
        }

        outcomes
    }
}

async fn run_transfer(context: &TransferContext, task: &TransferTask) -> Result<(), SyncError> {
    let handle = context
        .retry
        .run("resolve_fetch_handle", || {
            context
                .source
                .resolve_fetch_handle(&task.file_id, &task.version)
        })
        .await
        .map_err(|cause| SyncError::FetchHandle {
            file_id: task.file_id.clone(),
            attempts: context.retry.max_attempts,
            cause,
        })?;

    let content = context
        .source
        .open_content(&handle)
        .await
        .map_err(|cause| SyncError::Transfer {
            key: task.key.clone(),
            cause: cause.context("failed to open source content"),
        })?;

    context
        .destination
        .put_object(
            &task.key,
            ObjectBody::Stream(content),
            ObjectMetadata::with_version(task.version.clone()),
        )
        .await
        .map_err(|cause| SyncError::Transfer {
            key: task.key.clone(),
            cause,
        })?;

    debug!(key = %task.key, version = %task.version, "Transfer complete");
    Ok(())
}
