//! Finding the policy file that governs a path.

use crate::mapper::PathMapper;
use localns_core::{Error, ParsedPath, PathName, Result};
use std::fs;

/// Walks a path's ancestors, nearest first, looking for a policy file.
///
/// Nothing is cached: policy edits take effect on the next request.
pub struct AccessResolver<'a> {
    mapper: &'a PathMapper,
    file_name: &'a str,
}

impl<'a> AccessResolver<'a> {
    pub fn new(mapper: &'a PathMapper, file_name: &'a str) -> Self {
        AccessResolver { mapper, file_name }
    }

    /// The logical path of the nearest policy file, or `None` if no
    /// ancestor up to and including the root has one.
    ///
    /// A missing ancestor directory is an error, not a reason to keep
    /// walking. A policy file that exists but is not a regular file or
    /// cannot be opened is also an error.
    pub fn resolve(&self, parsed: &ParsedPath) -> Result<Option<PathName>> {
        for prefix in parsed.ancestors() {
            let dir = self.mapper.to_local(&prefix);
            let meta = fs::metadata(&dir).map_err(|e| Error::io(&dir, "stat", e))?;
            if !meta.is_dir() {
                continue;
            }

            let candidate = dir.join(self.file_name);
            let meta = match fs::metadata(&candidate) {
                Ok(meta) => meta,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::trace!(dir = %prefix, "no policy file");
                    continue;
                }
                Err(e) => return Err(Error::io(&candidate, "stat", e)),
            };

            let policy = prefix.join(self.file_name)?.path();
            if !meta.is_file() {
                return Err(Error::invalid(
                    "policy file",
                    format!("{policy} is not a regular file"),
                ));
            }
            fs::File::open(&candidate).map_err(|e| Error::io(&candidate, "open", e))?;

            tracing::trace!(path = %parsed, %policy, "policy file found");
            return Ok(Some(policy));
        }
        Ok(None)
    }
}
