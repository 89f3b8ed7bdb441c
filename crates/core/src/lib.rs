//! Core domain types, errors, and constants for `localns`.
//!
//! `localns` serves a local directory tree as a read-only, versioned and
//! signed name space. This crate holds the vocabulary every other crate
//! speaks:
//!
//! - **`errors`**: the `Error` enum, its `ErrorKind` projection and the
//!   `Result` alias. Every failure in the workspace ends up here.
//! - **`types`**: logical path names, access rights, directory entries,
//!   versions, content references and the fixed-size signature buffer.
//! - **`constants`**: shared names and limits.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, ErrorKind, Result, ResultExt},
    types::*,
};
