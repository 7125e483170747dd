//! Source store port (driven/secondary port)
//!
//! This module defines the interface for reading a hierarchical document
//! store. The primary implementation targets Amazon WorkDocs, but the trait
//! only assumes paginated folder listings and short-lived content handles.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific;
//!   the engine classifies them by the operation that failed.
//! - Fetch handles may expire. Callers resolve one immediately before each
//!   transfer attempt and never cache it across tasks.

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use url::Url;

use crate::domain::newtypes::{FileId, FolderId, VersionToken};

/// A child folder in a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    /// Source folder identifier
    pub id: FolderId,
    /// Folder name (a single path segment, unescaped)
    pub name: String,
}

/// A child file in a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Source document identifier
    pub id: FileId,
    /// File name (a single path segment, unescaped)
    pub name: String,
    /// Latest version of the document
    pub version: VersionToken,
}

/// One page of a folder listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildrenPage {
    /// Child folders in this page
    pub folders: Vec<FolderRef>,
    /// Child files in this page
    pub files: Vec<FileRef>,
    /// Continuation token for the next page (None if this is the last page)
    pub next_token: Option<String>,
}

/// Short-lived handle from which a file version's content can be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchHandle {
    /// Document the handle refers to
    pub file_id: FileId,
    /// Version the handle refers to
    pub version: VersionToken,
    /// Pre-signed download location
    pub url: Url,
}

/// A byte stream read from the source
///
/// Chunks are yielded as they arrive; the whole content is never buffered.
pub struct ContentStream {
    /// Total length if the source reported one
    pub content_length: Option<u64>,
    /// The content chunks
    pub stream: BoxStream<'static, anyhow::Result<Bytes>>,
}

impl ContentStream {
    /// Creates a stream from already-known chunks (used by in-memory adapters)
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        let content_length = chunks.iter().map(|c| c.len() as u64).sum();
        Self {
            content_length: Some(content_length),
            stream: stream::iter(chunks.into_iter().map(Ok)).boxed(),
        }
    }

    /// Creates a single-chunk stream
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::from_chunks(vec![data.into()])
    }
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Port trait for the hierarchical source store
#[async_trait::async_trait]
pub trait ISourceStore: Send + Sync {
    /// Lists one page of a folder's direct children
    ///
    /// # Arguments
    /// * `folder_id` - The folder to list
    /// * `continuation` - Token from the previous page, `None` for the first page
    async fn list_children(
        &self,
        folder_id: &FolderId,
        continuation: Option<&str>,
    ) -> anyhow::Result<ChildrenPage>;

    /// Resolves a short-lived fetch handle for a file version
    async fn resolve_fetch_handle(
        &self,
        file_id: &FileId,
        version: &VersionToken,
    ) -> anyhow::Result<FetchHandle>;

    /// Opens the content behind a fetch handle as a stream
    async fn open_content(&self, handle: &FetchHandle) -> anyhow::Result<ContentStream>;
}
