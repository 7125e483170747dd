//! Source tree walker
//!
//! [`TreeWalker`] yields every folder and file below a root folder in
//! pre-order: each folder is followed immediately by its whole subtree.
//! Within one listing page the page's folders come before its files, and the
//! next page of a folder is requested only once the current page has been
//! consumed. Open folders are kept on an explicit stack, so tree depth never
//! grows the call stack.
//!
//! A listing failure aborts the walk. Entries already yielded stay yielded;
//! the walker is fused afterwards and returns `Ok(None)` forever.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use docmirror_core::domain::entry::TreeEntry;
use docmirror_core::domain::newtypes::FolderId;
use docmirror_core::ports::source_store::ISourceStore;

use crate::path::join_path;
use crate::SyncError;

/// One open folder on the walk stack
#[derive(Debug)]
struct Frame {
    folder_id: FolderId,
    path: String,
    pending: VecDeque<TreeEntry>,
    next_token: Option<String>,
    exhausted: bool,
}

impl Frame {
    fn new(folder_id: FolderId, path: String) -> Self {
        Self {
            folder_id,
            path,
            pending: VecDeque::new(),
            next_token: None,
            exhausted: false,
        }
    }
}

/// Lazy, depth-first walker over a paginated source tree
pub struct TreeWalker {
    source: Arc<dyn ISourceStore>,
    stack: Vec<Frame>,
    visited: HashSet<FolderId>,
    pages_fetched: u64,
    failed: bool,
}

impl TreeWalker {
    /// Start a walk below `root`
    ///
    /// The root itself is not yielded; its children have paths relative to it.
    pub fn new(source: Arc<dyn ISourceStore>, root: FolderId) -> Self {
        let mut visited = HashSet::new();
        visited.insert(root.clone());
        Self {
            source,
            stack: vec![Frame::new(root, String::new())],
            visited,
            pages_fetched: 0,
            failed: false,
        }
    }

    /// Number of listing pages requested so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Pull the next entry
    ///
    /// # Returns
    /// `Ok(None)` once the walk is complete or after a failure
    ///
    /// # Errors
    /// Returns [`SyncError::SourceListing`] if a listing page cannot be fetched
    pub async fn next(&mut self) -> Result<Option<TreeEntry>, SyncError> {
        loop {
            if self.failed {
                return Ok(None);
            }

            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if let Some(entry) = frame.pending.pop_front() {
                if let TreeEntry::Folder { id, path } = &entry {
                    self.descend(id, path);
                }
                return Ok(Some(entry));
            }

            if frame.exhausted {
                self.stack.pop();
                continue;
            }

            let token = frame.next_token.take();
            self.pages_fetched += 1;
            let page = match self
                .source
                .list_children(&frame.folder_id, token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(cause) => {
                    self.failed = true;
                    return Err(SyncError::SourceListing {
                        folder_id: frame.folder_id.clone(),
                        cause,
                    });
                }
            };

            debug!(
                folder_id = %frame.folder_id,
                folders = page.folders.len(),
                files = page.files.len(),
                has_more = page.next_token.is_some(),
                "Listed source page"
            );

            frame.exhausted = page.next_token.is_none();
            frame.next_token = page.next_token;

            let parent = frame.path.as_str();
            let folders = page.folders.into_iter().map(|f| TreeEntry::Folder {
                path: join_path(parent, &f.name),
                id: f.id,
            });
            let files = page.files.into_iter().map(|f| TreeEntry::File {
                path: join_path(parent, &f.name),
                id: f.id,
                version: f.version,
            });
            let entries: Vec<TreeEntry> = folders.chain(files).collect();
            frame.pending.extend(entries);
        }
    }

    /// Drain the remaining entries into a vector
    pub async fn collect(mut self) -> Result<Vec<TreeEntry>, SyncError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    fn descend(&mut self, id: &FolderId, path: &str) {
        if self.visited.insert(id.clone()) {
            self.stack.push(Frame::new(id.clone(), path.to_string()));
        } else {
            warn!(folder_id = %id, path, "Folder already visited in this walk, not descending");
        }
    }
}
