//! Configuration for localns
//!
//! `ServerConfig` is assembled from defaults, an optional JSON file,
//! `LOCALNS_*` environment variables and explicit overrides, in increasing
//! order of precedence.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
