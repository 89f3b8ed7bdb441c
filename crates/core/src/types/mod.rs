//! Domain types for the `localns` name space.
//!
//! - **`path`**: user names, logical path names and their parsed form
//! - **`right`**: the access rights a policy can grant
//! - **`entry`**: signed directory entries and their parts
//! - **`reference`**: composite content references handed to the store

pub mod entry;
pub mod path;
pub mod reference;
pub mod right;

pub use entry::*;
pub use path::*;
pub use reference::*;
pub use right::*;
