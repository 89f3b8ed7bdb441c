//! Logical path names.
//!
//! A logical path has the form `owner/elem/elem...`. The owner is everything
//! before the first slash; the root of an owner's tree is `owner/`.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Deref;
use std::str::FromStr;

/// A validated principal name; never empty and never containing a slash
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Create a new UserName with validation
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid("user name", "empty user name"));
        }
        if name.contains('/') || name.chars().any(|c| c.is_whitespace() || c == '\0') {
            return Err(Error::invalid(
                "user name",
                format!("{name:?} contains a slash, whitespace or NUL"),
            ));
        }
        Ok(UserName(name))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for UserName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for UserName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

/// An unvalidated logical path name as it travels over the wire.
///
/// Use [`PathName::parse`] to obtain a [`ParsedPath`] before acting on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathName(String);

impl PathName {
    pub fn new(name: impl Into<String>) -> Self {
        PathName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Result<ParsedPath> {
        ParsedPath::parse(&self.0)
    }
}

impl Display for PathName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathName {
    fn from(s: &str) -> Self {
        PathName(s.to_string())
    }
}

impl From<String> for PathName {
    fn from(s: String) -> Self {
        PathName(s)
    }
}

/// A logical path split into its owner and elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedPath {
    user: UserName,
    elems: Vec<String>,
}

impl ParsedPath {
    /// Parse a logical path name.
    ///
    /// Repeated slashes collapse. `.` and `..` elements are rejected rather
    /// than resolved so a path can never climb out of its owner's tree.
    pub fn parse(name: &str) -> Result<Self> {
        let (user, rest) = match name.split_once('/') {
            Some((user, rest)) => (user, rest),
            None => (name, ""),
        };
        let user = UserName::new(user).map_err(|_| {
            Error::invalid("path", format!("{name:?}: missing or malformed user name"))
        })?;

        let mut elems = Vec::new();
        for elem in rest.split('/').filter(|e| !e.is_empty()) {
            check_elem(name, elem)?;
            elems.push(elem.to_string());
        }
        Ok(ParsedPath { user, elems })
    }

    /// The root of `user`'s tree
    pub fn root(user: UserName) -> Self {
        ParsedPath {
            user,
            elems: Vec::new(),
        }
    }

    pub fn user(&self) -> &UserName {
        &self.user
    }

    /// Number of elements after the user name
    pub fn nelem(&self) -> usize {
        self.elems.len()
    }

    pub fn elems(&self) -> &[String] {
        &self.elems
    }

    pub fn last(&self) -> Option<&str> {
        self.elems.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.elems.is_empty()
    }

    /// The path with its last `n` elements removed; saturates at the root
    #[must_use]
    pub fn drop(&self, n: usize) -> ParsedPath {
        let keep = self.elems.len().saturating_sub(n);
        ParsedPath {
            user: self.user.clone(),
            elems: self.elems[..keep].to_vec(),
        }
    }

    /// The path with its first `n` elements only
    #[must_use]
    pub fn first(&self, n: usize) -> ParsedPath {
        let keep = n.min(self.elems.len());
        ParsedPath {
            user: self.user.clone(),
            elems: self.elems[..keep].to_vec(),
        }
    }

    /// Append one element
    pub fn join(&self, elem: &str) -> Result<ParsedPath> {
        check_elem(elem, elem)?;
        let mut elems = self.elems.clone();
        elems.push(elem.to_string());
        Ok(ParsedPath {
            user: self.user.clone(),
            elems,
        })
    }

    /// Candidate prefixes from the full path up to and including the root.
    ///
    /// Yields `nelem() + 1` paths, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = ParsedPath> + '_ {
        (0..=self.elems.len()).map(move |i| self.drop(i))
    }

    /// The canonical logical path name
    pub fn path(&self) -> PathName {
        PathName(self.to_string())
    }

    /// The elements joined by `/`, relative to the owner's root; empty for the root
    pub fn file_path(&self) -> String {
        self.elems.join("/")
    }
}

impl Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.elems.join("/"))
    }
}

fn check_elem(name: &str, elem: &str) -> Result<()> {
    if elem.is_empty() || elem.contains('/') {
        return Err(Error::invalid("path", format!("{name:?}: bad element {elem:?}")));
    }
    if elem == "." || elem == ".." {
        return Err(Error::invalid(
            "path",
            format!("{name:?}: relative element {elem:?}"),
        ));
    }
    if elem.contains('\0') {
        return Err(Error::invalid("path", format!("{name:?}: contains NUL")));
    }
    Ok(())
}
