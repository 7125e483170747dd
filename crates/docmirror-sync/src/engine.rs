//! Reconciliation engine
//!
//! The [`ReconciliationEngine`] mirrors a source folder tree into a flat
//! destination key-space.
//!
//! ## Run Flow
//!
//! 1. **ListingBaseline**: snapshot every destination key under the prefix
//! 2. **Walking**: walk the source tree; ensure folder placeholders, check
//!    each file's staleness and submit transfers for missing/stale files
//! 3. **Draining**: wait for all submitted transfers
//! 4. **DeletingStale**: delete baseline keys the walk did not observe
//! 5. **Done**: return the [`RunSummary`]
//!
//! A walk failure (or cancellation) moves the run to `Failed`. Transfers
//! already submitted still drain, but nothing is deleted.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use docmirror_core::domain::entry::TreeEntry;
use docmirror_core::domain::newtypes::{DestinationKey, FolderId, RunId};
use docmirror_core::domain::phase::RunPhase;
use docmirror_core::ports::object_store::{IObjectStore, ObjectBody, ObjectMetadata};
use docmirror_core::ports::source_store::ISourceStore;

use crate::oracle::{Freshness, StalenessOracle};
use crate::path::PathMapper;
use crate::pool::{TransferContext, TransferKind, TransferOutcome, TransferPool, TransferTask};
use crate::retry::RetryPolicy;
use crate::walker::TreeWalker;
use crate::SyncError;

// ============================================================================
// RunSummary
// ============================================================================

/// Summary of a reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Identifier of the run (appears in log spans)
    pub run_id: RunId,
    /// Phase the run ended in (`done` or `failed`)
    pub phase: RunPhase,
    /// True if no destination writes or deletes were issued
    pub dry_run: bool,
    /// Folder placeholders created (or already present)
    pub folders_ensured: u64,
    /// Folder placeholders that could not be created
    pub placeholder_failures: u64,
    /// Files transferred to keys that had no object
    pub files_created: u64,
    /// Files transferred over a stale object
    pub files_updated: u64,
    /// Files whose destination object was already up to date
    pub files_skipped: u64,
    /// Files whose transfer failed
    pub files_failed: u64,
    /// Stale objects deleted
    pub objects_deleted: u64,
    /// Stale objects that could not be deleted
    pub delete_failures: u64,
    /// Non-fatal error messages
    pub errors: Vec<String>,
    /// The error that moved the run to `Failed`
    pub fatal_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    fn new(dry_run: bool) -> Self {
        Self {
            run_id: RunId::new(),
            phase: RunPhase::ListingBaseline,
            dry_run,
            folders_ensured: 0,
            placeholder_failures: 0,
            files_created: 0,
            files_updated: 0,
            files_skipped: 0,
            files_failed: 0,
            objects_deleted: 0,
            delete_failures: 0,
            errors: Vec::new(),
            fatal_error: None,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: 0,
        }
    }

    /// Files created plus files updated
    pub fn files_transferred(&self) -> u64 {
        self.files_created + self.files_updated
    }

    /// True if the run completed all phases
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Done
    }

    fn advance(&mut self, next: RunPhase) -> Result<(), SyncError> {
        self.phase = self.phase.transition(next)?;
        info!(run_id = %self.run_id, phase = %self.phase, "Entering phase");
        Ok(())
    }
}

// ============================================================================
// EngineOptions
// ============================================================================

/// Parameters of a reconciliation run
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Source folder mirrored to the destination prefix
    pub root_folder_id: FolderId,
    /// Maximum concurrent transfers
    pub max_workers: usize,
    /// Retry policy for fetch handle resolution
    pub retry: RetryPolicy,
    /// Compute the plan without writing or deleting anything
    pub dry_run: bool,
}

impl EngineOptions {
    pub fn new(root_folder_id: FolderId) -> Self {
        Self {
            root_folder_id,
            max_workers: 14,
            retry: RetryPolicy::default(),
            dry_run: false,
        }
    }
}

// ============================================================================
// ReconciliationEngine
// ============================================================================

/// Mirrors a source tree into a destination prefix
pub struct ReconciliationEngine {
    source: Arc<dyn ISourceStore>,
    destination: Arc<dyn IObjectStore>,
    mapper: PathMapper,
    oracle: StalenessOracle,
    options: EngineOptions,
    cancel: CancellationToken,
}

impl ReconciliationEngine {
    pub fn new(
        source: Arc<dyn ISourceStore>,
        destination: Arc<dyn IObjectStore>,
        mapper: PathMapper,
        options: EngineOptions,
    ) -> Self {
        Self {
            oracle: StalenessOracle::new(Arc::clone(&destination)),
            source,
            destination,
            mapper,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that stops the walk when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    /// A [`RunSummary`] whose `phase` is `Done`, or `Failed` if the walk
    /// failed or was cancelled (no deletions happen in that case)
    ///
    /// # Errors
    /// Returns [`SyncError::BaselineListing`] if the destination baseline
    /// cannot be listed; nothing has been written at that point
    #[tracing::instrument(skip(self), fields(root = %self.options.root_folder_id, prefix = %self.mapper.prefix()))]
    pub async fn sync(&self) -> Result<RunSummary, SyncError> {
        let start = std::time::Instant::now();
        let mut summary = RunSummary::new(self.options.dry_run);

        info!(
            run_id = %summary.run_id,
            dry_run = self.options.dry_run,
            max_workers = self.options.max_workers,
            "Starting reconciliation run"
        );

        // Phase 1: baseline
        let baseline = match self.list_baseline().await {
            Ok(baseline) => baseline,
            Err(err) => {
                error!(error = %err, "Baseline listing failed");
                return Err(err);
            }
        };
        info!(keys = baseline.len(), "Baseline listed");

        // Phase 2: walk
        summary.advance(RunPhase::Walking)?;
        let context = Arc::new(TransferContext {
            source: Arc::clone(&self.source),
            destination: Arc::clone(&self.destination),
            retry: self.options.retry,
        });
        let mut pool = TransferPool::new(context, self.options.max_workers);
        let mut observed: HashSet<DestinationKey> = HashSet::new();

        let walk_result = self.walk(&mut pool, &mut observed, &mut summary).await;

        if let Err(err) = &walk_result {
            error!(error = %err, "Walk aborted, skipping deletion");
            summary.fatal_error = Some(err.to_string());
            summary.advance(RunPhase::Failed)?;
        } else {
            summary.advance(RunPhase::Draining)?;
        }

        // Phase 3: drain (also after a failed walk)
        self.collect_outcomes(pool.drain().await, &mut summary);

        // Phase 4: delete stale keys, only after a complete walk
        if walk_result.is_ok() {
            summary.advance(RunPhase::DeletingStale)?;
            self.delete_stale(&baseline, &observed, &mut summary).await;
            summary.advance(RunPhase::Done)?;
        }

        summary.finished_at = Some(Utc::now());
        summary.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            run_id = %summary.run_id,
            phase = %summary.phase,
            folders_ensured = summary.folders_ensured,
            files_created = summary.files_created,
            files_updated = summary.files_updated,
            files_skipped = summary.files_skipped,
            files_failed = summary.files_failed,
            objects_deleted = summary.objects_deleted,
            errors = summary.errors.len(),
            duration_ms = summary.duration_ms,
            "Reconciliation run finished"
        );

        Ok(summary)
    }

    async fn list_baseline(&self) -> Result<BTreeSet<DestinationKey>, SyncError> {
        let prefix = self.mapper.prefix();
        let mut keys = BTreeSet::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .destination
                .list_objects(prefix, token.as_deref())
                .await
                .map_err(|cause| SyncError::BaselineListing {
                    prefix: prefix.to_string(),
                    cause,
                })?;
            keys.extend(page.keys);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn walk(
        &self,
        pool: &mut TransferPool,
        observed: &mut HashSet<DestinationKey>,
        summary: &mut RunSummary,
    ) -> Result<(), SyncError> {
        let mut walker = TreeWalker::new(
            Arc::clone(&self.source),
            self.options.root_folder_id.clone(),
        );

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(SyncError::Cancelled),
                next = walker.next() => next,
            };

            match next? {
                Some(entry) if entry.is_folder() => {
                    self.ensure_placeholder(&entry, observed, summary).await;
                }
                Some(entry) => {
                    self.reconcile_file(entry, pool, observed, summary).await?;
                }
                None => break,
            }
        }

        debug!(
            pages = walker.pages_fetched(),
            transfers = pool.submitted(),
            "Walk complete"
        );
        Ok(())
    }

    async fn ensure_placeholder(
        &self,
        entry: &TreeEntry,
        observed: &mut HashSet<DestinationKey>,
        summary: &mut RunSummary,
    ) {
        let key = self.mapper.key_for(entry);
        observed.insert(key.clone());

        if self.options.dry_run {
            debug!(key = %key, "Would ensure placeholder");
            summary.folders_ensured += 1;
            return;
        }

        match self
            .destination
            .put_object(&key, ObjectBody::Empty, ObjectMetadata::default())
            .await
        {
            Ok(()) => {
                debug!(key = %key, "Placeholder ensured");
                summary.folders_ensured += 1;
            }
            Err(cause) => {
                let err = SyncError::Placeholder { key, cause };
                warn!(error = %err, "Placeholder creation failed");
                summary.placeholder_failures += 1;
                summary.errors.push(err.to_string());
            }
        }
    }

    async fn reconcile_file(
        &self,
        entry: TreeEntry,
        pool: &mut TransferPool,
        observed: &mut HashSet<DestinationKey>,
        summary: &mut RunSummary,
    ) -> Result<(), SyncError> {
        let key = self.mapper.key_for(&entry);
        let TreeEntry::File { id, version, .. } = entry else {
            return Ok(());
        };
        observed.insert(key.clone());

        let kind = match self.oracle.check_fresh(&key, &version).await {
            Freshness::UpToDate => {
                debug!(key = %key, version = %version, "Up to date");
                summary.files_skipped += 1;
                return Ok(());
            }
            Freshness::Missing => TransferKind::Create,
            Freshness::Stale => TransferKind::Update,
        };

        if self.options.dry_run {
            debug!(key = %key, kind = ?kind, "Would transfer");
            match kind {
                TransferKind::Create => summary.files_created += 1,
                TransferKind::Update => summary.files_updated += 1,
            }
            return Ok(());
        }

        pool.submit(TransferTask {
            file_id: id,
            version,
            key,
            kind,
        })
        .await
    }

    fn collect_outcomes(
        &self,
        outcomes: Vec<TransferOutcome>,
        summary: &mut RunSummary,
    ) {
        for outcome in outcomes {
            match outcome.result {
                Ok(()) => match outcome.kind {
                    TransferKind::Create => summary.files_created += 1,
                    TransferKind::Update => summary.files_updated += 1,
                },
                Err(err) => {
                    summary.files_failed += 1;
                    summary.errors.push(err.to_string());
                }
            }
        }
    }

    async fn delete_stale(
        &self,
        baseline: &BTreeSet<DestinationKey>,
        observed: &HashSet<DestinationKey>,
        summary: &mut RunSummary,
    ) {
        let root_key = self.mapper.root_key();
        let stale: Vec<&DestinationKey> = baseline
            .iter()
            .filter(|key| !observed.contains(*key))
            .filter(|key| root_key.as_ref() != Some(*key))
            .collect();

        info!(count = stale.len(), "Deleting stale objects");

        for key in stale {
            if self.options.dry_run {
                debug!(key = %key, "Would delete");
                summary.objects_deleted += 1;
                continue;
            }

            match self.destination.delete_object(key).await {
                Ok(()) => {
                    debug!(key = %key, "Deleted stale object");
                    summary.objects_deleted += 1;
                }
                Err(cause) => {
                    let err = SyncError::DestinationDelete {
                        key: key.clone(),
                        cause,
                    };
                    warn!(error = %err, "Delete failed");
                    summary.delete_failures += 1;
                    summary.errors.push(err.to_string());
                }
            }
        }
    }
}
