//! DocMirror Sync - Tree-to-bucket reconciliation engine
//!
//! Provides:
//! - Lazy depth-first walking of a paginated source tree
//! - Injective mapping of tree paths to flat destination keys
//! - Version-token staleness checks against the destination
//! - A bounded worker pool for streamed transfers
//! - Deletion of destination objects that no longer exist in the source
//!
//! ## Modules
//!
//! - [`engine`] - Reconciliation controller driving the run phases
//! - [`walker`] - Source tree walker
//! - [`path`] - Path-to-key mapping
//! - [`oracle`] - Staleness oracle
//! - [`pool`] - Transfer worker pool
//! - [`retry`] - Exponential backoff retry policy

pub mod engine;
pub mod oracle;
pub mod path;
pub mod pool;
pub mod retry;
pub mod walker;

pub use engine::{EngineOptions, ReconciliationEngine, RunSummary};

use docmirror_core::domain::errors::DomainError;
use docmirror_core::domain::newtypes::{DestinationKey, FileId, FolderId};
use thiserror::Error;

/// Errors that can occur during a reconciliation run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing the destination baseline failed; nothing was mutated
    #[error("Failed to list destination baseline under '{prefix}': {cause:#}")]
    BaselineListing {
        prefix: String,
        #[source]
        cause: anyhow::Error,
    },

    /// A source listing page could not be fetched; the walk is aborted
    #[error("Failed to list source folder {folder_id}: {cause:#}")]
    SourceListing {
        folder_id: FolderId,
        #[source]
        cause: anyhow::Error,
    },

    /// A fetch handle could not be resolved within the retry bound
    #[error("Failed to resolve fetch handle for {file_id} after {attempts} attempts: {cause:#}")]
    FetchHandle {
        file_id: FileId,
        attempts: u32,
        #[source]
        cause: anyhow::Error,
    },

    /// Streaming content to the destination failed
    #[error("Transfer to {key} failed: {cause:#}")]
    Transfer {
        key: DestinationKey,
        #[source]
        cause: anyhow::Error,
    },

    /// A destination metadata lookup failed with something other than not-found
    #[error("Destination lookup for {key} failed: {cause:#}")]
    DestinationLookup {
        key: DestinationKey,
        #[source]
        cause: anyhow::Error,
    },

    /// Deleting a stale destination object failed
    #[error("Failed to delete {key}: {cause:#}")]
    DestinationDelete {
        key: DestinationKey,
        #[source]
        cause: anyhow::Error,
    },

    /// Creating a folder placeholder failed
    #[error("Failed to create placeholder {key}: {cause:#}")]
    Placeholder {
        key: DestinationKey,
        #[source]
        cause: anyhow::Error,
    },

    /// The run was cancelled before the walk completed
    #[error("Run cancelled")]
    Cancelled,

    /// A domain-level error propagated from docmirror-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}
