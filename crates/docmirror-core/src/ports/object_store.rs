//! Destination object store port (driven/secondary port)
//!
//! A flat key-space with per-object string metadata. The primary
//! implementation targets Amazon S3 and S3-compatible endpoints.
//!
//! ## Contract
//!
//! - `head_object` returns `Ok(None)` for "not found" and `Err` for every
//!   other failure, so callers can tell absence from ambiguity.
//! - `put_object` writes content and metadata atomically: readers observe
//!   either the previous object (or none) or the complete new object with its
//!   metadata, never a partially written one.
//! - `put_object` is an idempotent overwrite.

use crate::domain::newtypes::{DestinationKey, VersionToken};
use crate::ports::source_store::ContentStream;

/// Custom metadata attached to a destination object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Source version the object was written from
    pub version_token: Option<VersionToken>,
}

impl ObjectMetadata {
    /// Metadata carrying a version token
    pub fn with_version(version: VersionToken) -> Self {
        Self {
            version_token: Some(version),
        }
    }
}

/// Body of an object write
#[derive(Debug)]
pub enum ObjectBody {
    /// Zero-length object (folder placeholders)
    Empty,
    /// Streamed content
    Stream(ContentStream),
}

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Keys in this page
    pub keys: Vec<DestinationKey>,
    /// Continuation token for the next page (None if this is the last page)
    pub next_token: Option<String>,
}

/// Port trait for the destination object store
#[async_trait::async_trait]
pub trait IObjectStore: Send + Sync {
    /// Fetches an object's metadata without its content
    ///
    /// # Returns
    /// `Ok(None)` if no object exists at `key`
    async fn head_object(&self, key: &DestinationKey) -> anyhow::Result<Option<ObjectMetadata>>;

    /// Writes an object together with its metadata
    async fn put_object(
        &self,
        key: &DestinationKey,
        body: ObjectBody,
        metadata: ObjectMetadata,
    ) -> anyhow::Result<()>;

    /// Lists one page of keys under `prefix`
    async fn list_objects(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> anyhow::Result<ObjectPage>;

    /// Deletes the object at `key`
    async fn delete_object(&self, key: &DestinationKey) -> anyhow::Result<()>;
}
