//! Path-to-key mapping
//!
//! Source names are single path segments that may contain any character,
//! including the destination separator. Each segment is percent-escaped
//! (`%` → `%25`, `/` → `%2F`) before joining so that distinct
//! `(parent, name)` pairs always map to distinct keys. Names without those
//! two characters are left untouched.

use std::borrow::Cow;

use docmirror_core::domain::entry::TreeEntry;
use docmirror_core::domain::newtypes::{DestinationKey, KEY_SEPARATOR};

/// Escape a single name segment for use in a logical path
pub fn escape_segment(name: &str) -> Cow<'_, str> {
    if !name.contains(['%', KEY_SEPARATOR]) {
        return Cow::Borrowed(name);
    }

    let mut escaped = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            KEY_SEPARATOR => escaped.push_str("%2F"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Join a logical parent path and an unescaped child name
///
/// An empty parent denotes the sync root.
pub fn join_path(parent: &str, name: &str) -> String {
    let segment = escape_segment(name);
    if parent.is_empty() {
        segment.into_owned()
    } else {
        format!("{parent}{KEY_SEPARATOR}{segment}")
    }
}

/// Maps logical tree paths to destination keys under a fixed prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    prefix: String,
}

impl PathMapper {
    /// Create a mapper for `prefix`
    ///
    /// Leading separators are stripped and a single trailing separator is
    /// appended when the remaining prefix is non-empty.
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_matches(KEY_SEPARATOR);
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}{KEY_SEPARATOR}")
        };
        Self { prefix }
    }

    /// The normalised prefix (empty or ending in the separator)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of the prefix's own placeholder, if the prefix is non-empty
    ///
    /// This key is never considered stale.
    pub fn root_key(&self) -> Option<DestinationKey> {
        if self.prefix.is_empty() {
            None
        } else {
            Some(DestinationKey::new(self.prefix.clone()))
        }
    }

    /// Map a child of `parent_path` to its destination key
    pub fn map_path(&self, parent_path: &str, name: &str, is_folder: bool) -> DestinationKey {
        self.key_from_logical(&join_path(parent_path, name), is_folder)
    }

    /// Map an already-walked entry to its destination key
    pub fn key_for(&self, entry: &TreeEntry) -> DestinationKey {
        self.key_from_logical(entry.path(), entry.is_folder())
    }

    fn key_from_logical(&self, logical: &str, is_folder: bool) -> DestinationKey {
        let mut key = String::with_capacity(self.prefix.len() + logical.len() + 1);
        key.push_str(&self.prefix);
        key.push_str(logical);
        if is_folder {
            key.push(KEY_SEPARATOR);
        }
        DestinationKey::new(key)
    }
}
