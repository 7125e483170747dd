//! Source tree entries
//!
//! A [`TreeEntry`] is one node yielded by the tree walker. Its `path` is the
//! logical path from the sync root, built from escaped name segments joined
//! with [`KEY_SEPARATOR`](super::newtypes::KEY_SEPARATOR).

use serde::{Deserialize, Serialize};

use super::newtypes::{FileId, FolderId, VersionToken};

/// A folder or file discovered in the source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeEntry {
    /// A folder; its children follow it in the walk
    Folder {
        /// Source folder identifier
        id: FolderId,
        /// Logical path from the sync root (no trailing separator)
        path: String,
    },
    /// A file at a specific source version
    File {
        /// Source document identifier
        id: FileId,
        /// Latest version of the document
        version: VersionToken,
        /// Logical path from the sync root
        path: String,
    },
}

impl TreeEntry {
    /// Returns the logical path of the entry
    pub fn path(&self) -> &str {
        match self {
            TreeEntry::Folder { path, .. } | TreeEntry::File { path, .. } => path,
        }
    }

    /// Returns true if the entry is a folder
    pub fn is_folder(&self) -> bool {
        matches!(self, TreeEntry::Folder { .. })
    }
}
