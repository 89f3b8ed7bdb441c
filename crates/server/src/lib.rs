//! Read-only directory and store server for a local tree
//!
//! A [`Server`] exposes one local directory as its owner's tree. Each
//! request dials a lightweight handle carrying the caller's identity:
//!
//! - [`DirHandle`] answers lookups, one-level listings, globs and
//!   policy-file queries with signed entries;
//! - [`StoreHandle`] serves the bytes behind an entry's content reference.
//!
//! Mutations fail with a read-only error. Nothing is persisted; the only
//! shared state is the entry cache, which is keyed by object and therefore
//! valid for every caller.

mod access;
mod content;
mod glob;
mod listing;
mod mapper;
mod permission;
mod reader;
mod server;
mod synth;

pub use access::AccessResolver;
pub use content::{segment_name, ContentLocator};
pub use listing::DirectoryLister;
pub use mapper::PathMapper;
pub use permission::PermissionEvaluator;
pub use reader::LocalFileReader;
pub use server::{DirHandle, Server, StoreHandle};
pub use synth::EntrySynthesizer;
