//! File-reading collaborator backed by the local tree.

use crate::mapper::PathMapper;
use localns_core::{Error, ParsedPath, PathName, Result};
use localns_security::FileReader;
use std::fs;

/// Reads logical files from the served root.
///
/// Only world-readable files are served, whatever policy files say; this
/// keeps host files such as `~/.ssh` from leaking when a root is chosen too
/// broadly.
pub struct LocalFileReader<'a> {
    mapper: &'a PathMapper,
}

impl<'a> LocalFileReader<'a> {
    pub fn new(mapper: &'a PathMapper) -> Self {
        LocalFileReader { mapper }
    }
}

impl FileReader for LocalFileReader<'_> {
    fn read_file(&self, name: &PathName) -> Result<Vec<u8>> {
        let parsed = ParsedPath::parse(name.as_str())?;
        self.mapper.verify_owner(&parsed)?;
        let local = self.mapper.to_local(&parsed);

        let meta = fs::symlink_metadata(&local).map_err(|e| Error::io(&local, "stat", e))?;
        if meta.file_type().is_symlink() {
            return Err(Error::invalid(name.as_str(), "symbolic links are not served"));
        }
        if meta.is_dir() {
            return Err(Error::is_dir(name.as_str()));
        }
        if !world_readable(&meta) {
            tracing::warn!(path = %name, "refusing to read file that is not world-readable");
            return Err(Error::permission(name.as_str(), "not world-readable"));
        }

        fs::read(&local).map_err(|e| Error::io(&local, "read", e))
    }
}

#[cfg(unix)]
fn world_readable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o004 != 0
}

// No other-read bit to consult off unix.
#[cfg(not(unix))]
fn world_readable(_meta: &fs::Metadata) -> bool {
    true
}
