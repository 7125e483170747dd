//! DocMirror AWS - Source and destination adapters
//!
//! Provides:
//! - Amazon WorkDocs as the hierarchical source ([`workdocs::WorkDocsSource`])
//! - Streaming HTTP download of pre-signed content URLs ([`fetch::HttpContentFetcher`])
//! - Amazon S3 (or an S3-compatible endpoint) as the destination ([`s3::S3ObjectStore`])
//!
//! ## Modules
//!
//! - [`client`] - SDK configuration loading and adapter construction
//! - [`fetch`] - HTTP content fetcher
//! - [`s3`] - S3 object store with streamed multipart uploads
//! - [`workdocs`] - WorkDocs folder listing and version resolution

pub mod client;
pub mod fetch;
pub mod s3;
pub mod workdocs;

use thiserror::Error;

/// Errors raised by the AWS adapters
#[derive(Debug, Error)]
pub enum AwsError {
    /// A required configuration value is missing
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    /// An AWS service call failed
    #[error("{operation} failed: {message}")]
    Service {
        /// API operation name, e.g. `HeadObject`
        operation: &'static str,
        /// Rendered SDK error with its full context
        message: String,
    },

    /// A service response lacked a field the adapter relies on
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A content URL answered with a non-success status
    #[error("Content request returned HTTP {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl AwsError {
    /// Wrap an SDK error, keeping its full source chain in the message
    pub(crate) fn service(operation: &'static str, err: impl std::error::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Service { operation, message }
    }
}
