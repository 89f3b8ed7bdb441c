//! Mapping between logical path names and local file paths.

use localns_core::{Error, ParsedPath, PathName, Result, UserName};
use std::path::{Component, Path, PathBuf};

/// Maps the owner's tree onto a local root directory
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
    owner: UserName,
}

impl PathMapper {
    /// `root` must already be absolute and clean
    pub fn new(root: PathBuf, owner: UserName) -> Self {
        PathMapper { root, owner }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn owner(&self) -> &UserName {
        &self.owner
    }

    /// Reject paths outside the owner's tree
    pub fn verify_owner(&self, parsed: &ParsedPath) -> Result<()> {
        if parsed.user() != &self.owner {
            return Err(Error::invalid(
                "path",
                format!("{parsed}: mismatched user name {:?}", parsed.user().as_str()),
            ));
        }
        Ok(())
    }

    pub fn to_local(&self, parsed: &ParsedPath) -> PathBuf {
        let mut local = self.root.clone();
        local.extend(parsed.elems());
        local
    }

    /// The local path relative to the root, slash separated; empty for the root
    pub fn relative(&self, local: &Path) -> Result<String> {
        let rel = local.strip_prefix(&self.root).map_err(|_| {
            Error::internal(format!("{} is not in root", local.display()))
        })?;
        let mut elems = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        Error::invalid(
                            "path",
                            format!("{}: name is not valid UTF-8", local.display()),
                        )
                    })?;
                    elems.push(name);
                }
                _ => {
                    return Err(Error::internal(format!(
                        "{} is not in root",
                        local.display()
                    )))
                }
            }
        }
        Ok(elems.join("/"))
    }

    pub fn to_parsed(&self, local: &Path) -> Result<ParsedPath> {
        let rel = self.relative(local)?;
        ParsedPath::parse(&format!("{}/{}", self.owner, rel))
    }

    pub fn to_logical(&self, local: &Path) -> Result<PathName> {
        Ok(self.to_parsed(local)?.path())
    }
}
