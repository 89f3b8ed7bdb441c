//! One-level directory listings.

use crate::mapper::PathMapper;
use crate::permission::PermissionEvaluator;
use crate::synth::EntrySynthesizer;
use localns_core::{Entry, Error, ParsedPath, Result, Right};
use std::fs;

/// Lists the immediate children of a directory for one caller
pub struct DirectoryLister<'a> {
    mapper: &'a PathMapper,
    synth: &'a EntrySynthesizer<'a>,
    perms: &'a PermissionEvaluator<'a>,
}

impl<'a> DirectoryLister<'a> {
    pub fn new(
        mapper: &'a PathMapper,
        synth: &'a EntrySynthesizer<'a>,
        perms: &'a PermissionEvaluator<'a>,
    ) -> Self {
        DirectoryLister {
            mapper,
            synth,
            perms,
        }
    }

    /// Entries for the regular files and directories directly inside `dir`,
    /// sorted by name.
    ///
    /// Listing needs the list right on `dir` and fails as private
    /// otherwise. Children the caller may not read are returned incomplete.
    /// Symbolic links and special files are skipped, and `dir` itself must not
    /// be a symbolic link.
    pub fn list(&self, dir: &ParsedPath) -> Result<Vec<Entry>> {
        if !self.perms.can(Right::List, dir)? {
            return Err(Error::private(dir.path().as_str()));
        }

        let local = self.mapper.to_local(dir);
        let meta = fs::symlink_metadata(&local).map_err(|e| Error::io(&local, "stat", e))?;
        if !meta.is_dir() {
            return Err(Error::invalid(dir.path().as_str(), "not a directory"));
        }

        let mut children = fs::read_dir(&local)
            .map_err(|e| Error::io(&local, "read directory", e))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| Error::io(&local, "read directory", e))?;
        children.sort_by_key(|c| c.file_name());

        let mut entries = Vec::with_capacity(children.len());
        for child in children {
            let file_type = child
                .file_type()
                .map_err(|e| Error::io(child.path(), "stat", e))?;
            if !file_type.is_dir() && !file_type.is_file() {
                tracing::trace!(path = %child.path().display(), "skipping non-regular entry");
                continue;
            }
            let file_name = child.file_name();
            let Some(name) = file_name.to_str() else {
                tracing::warn!(path = %child.path().display(), "skipping name that is not valid UTF-8");
                continue;
            };

            let parsed = dir.join(name)?;
            let entry = self.synth.synthesize(&child.path())?;
            let mut entry = Entry::clone(&entry);
            if !self.perms.can(Right::Read, &parsed)? {
                entry.mark_incomplete();
            }
            entries.push(entry);
        }

        tracing::debug!(dir = %dir, count = entries.len(), "directory listed");
        Ok(entries)
    }
}
