//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the reconciliation engine depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ISourceStore`] - Hierarchical source listing and content access
//! - [`IObjectStore`] - Flat-namespace destination object operations

pub mod object_store;
pub mod source_store;

pub use object_store::{IObjectStore, ObjectBody, ObjectMetadata, ObjectPage};
pub use source_store::{ChildrenPage, ContentStream, FetchHandle, FileRef, FolderRef, ISourceStore};
