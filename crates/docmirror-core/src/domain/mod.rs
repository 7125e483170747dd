//! Domain entities
//!
//! This module contains the core domain types for DocMirror:
//! - Newtypes for source identifiers, version tokens and destination keys
//! - Source tree entries produced by the walker
//! - The run phase state machine
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod newtypes;
pub mod phase;

// Re-export commonly used types
pub use entry::TreeEntry;
pub use errors::DomainError;
pub use newtypes::*;
pub use phase::RunPhase;
