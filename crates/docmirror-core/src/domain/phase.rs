//! Reconciliation run phases
//!
//! A run moves strictly forward through
//! `ListingBaseline → Walking → Draining → DeletingStale → Done`.
//! `Failed` is reachable only from `ListingBaseline` and `Walking`; a failed
//! walk still drains in-flight transfers, which is modelled as
//! `Walking → Failed` followed by the terminal drain inside the engine.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Phase of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Enumerating destination keys under the sync prefix
    ListingBaseline,
    /// Consuming the source tree walk and submitting transfers
    Walking,
    /// Waiting for submitted transfers to finish
    Draining,
    /// Deleting baseline keys that were not observed in the walk
    DeletingStale,
    /// Run finished; summary is final
    Done,
    /// Run aborted by a phase-level error; no deletions were performed
    Failed,
}

impl RunPhase {
    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (RunPhase::ListingBaseline, RunPhase::Walking)
                | (RunPhase::ListingBaseline, RunPhase::Failed)
                | (RunPhase::Walking, RunPhase::Draining)
                | (RunPhase::Walking, RunPhase::Failed)
                | (RunPhase::Draining, RunPhase::DeletingStale)
                | (RunPhase::DeletingStale, RunPhase::Done)
        )
    }

    /// Transition to `next`, returning the new phase
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidState`] for an illegal transition
    pub fn transition(self, next: RunPhase) -> Result<RunPhase, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidState {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunPhase::ListingBaseline => "listing_baseline",
            RunPhase::Walking => "walking",
            RunPhase::Draining => "draining",
            RunPhase::DeletingStale => "deleting_stale",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
