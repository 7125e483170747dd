//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation failures and invalid phase transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid source folder identifier
    #[error("Invalid folder ID: {0}")]
    InvalidFolderId(String),

    /// Invalid source file (document) identifier
    #[error("Invalid file ID: {0}")]
    InvalidFileId(String),

    /// Invalid version token
    #[error("Invalid version token: {0}")]
    InvalidVersionToken(String),

    /// Invalid run phase transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}
