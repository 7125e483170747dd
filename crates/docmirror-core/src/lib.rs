//! DocMirror Core - Domain types and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `TreeEntry`, `DestinationKey`, `VersionToken`, `RunPhase`
//! - **Port definitions** - Traits for adapters: `ISourceStore`, `IObjectStore`
//! - **Configuration** - YAML-backed run parameters with validation
//!
//! # Architecture
//!
//! The domain module holds pure data with no I/O. Ports define the trait
//! interfaces that adapter crates implement (WorkDocs, S3, in-memory fakes).
//! The reconciliation engine in `docmirror-sync` drives everything through
//! these ports.

pub mod config;
pub mod domain;
pub mod ports;
