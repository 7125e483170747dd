//! Staleness oracle
//!
//! Decides whether a destination object already holds a given source
//! version, using one metadata-only lookup per check.

use std::sync::Arc;

use tracing::{debug, warn};

use docmirror_core::domain::newtypes::{DestinationKey, VersionToken};
use docmirror_core::ports::object_store::IObjectStore;

use crate::SyncError;

/// Result of comparing a destination object with a source version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The object exists and carries exactly this version token
    UpToDate,
    /// No object exists at the key
    Missing,
    /// The object exists with another (or no) version token, or its state
    /// could not be determined
    Stale,
}

/// Compares destination metadata against source version tokens
#[derive(Clone)]
pub struct StalenessOracle {
    destination: Arc<dyn IObjectStore>,
}

impl StalenessOracle {
    pub fn new(destination: Arc<dyn IObjectStore>) -> Self {
        Self { destination }
    }

    /// Check whether `key` holds `version`
    ///
    /// Lookup errors other than not-found are logged and reported as
    /// [`Freshness::Stale`], which forces a re-transfer.
    pub async fn check_fresh(&self, key: &DestinationKey, version: &VersionToken) -> Freshness {
        match self.destination.head_object(key).await {
            Ok(None) => Freshness::Missing,
            Ok(Some(metadata)) => match metadata.version_token {
                Some(stored) if &stored == version => Freshness::UpToDate,
                stored => {
                    debug!(
                        key = %key,
                        stored = stored.as_ref().map(VersionToken::as_str).unwrap_or("<none>"),
                        source = %version,
                        "Destination object is stale"
                    );
                    Freshness::Stale
                }
            },
            Err(cause) => {
                let err = SyncError::DestinationLookup {
                    key: key.clone(),
                    cause,
                };
                warn!(error = %err, "Treating object as stale");
                Freshness::Stale
            }
        }
    }
}
