//! Security collaborators for localns
//!
//! This crate provides:
//! - Entry signing with ed25519 keys, including a rotation key
//! - Signature verification against either the current or previous key
//! - Key file loading and generation
//! - Access policy files and their evaluation

pub mod access;
pub mod keys;
pub mod signing;

pub use access::*;
pub use keys::*;
pub use signing::*;
