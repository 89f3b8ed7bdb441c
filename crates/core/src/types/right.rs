use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// An access right a policy can grant on a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    /// Read file contents
    Read,
    /// Overwrite existing files
    Write,
    /// List directories and look up entries
    List,
    /// Create new entries
    Create,
    /// Remove entries
    Delete,
    /// Satisfied by any one of the concrete rights
    AnyRight,
}

impl Right {
    /// Every concrete right, excluding [`Right::AnyRight`]
    pub const ALL: [Right; 5] = [
        Right::Read,
        Right::Write,
        Right::List,
        Right::Create,
        Right::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Right::Read => "read",
            Right::Write => "write",
            Right::List => "list",
            Right::Create => "create",
            Right::Delete => "delete",
            Right::AnyRight => "any",
        }
    }
}

impl Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Right {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" | "r" => Ok(Right::Read),
            "write" | "w" => Ok(Right::Write),
            "list" | "l" => Ok(Right::List),
            "create" | "c" => Ok(Right::Create),
            "delete" | "d" => Ok(Right::Delete),
            other => Err(Error::invalid("right", format!("unknown right {other:?}"))),
        }
    }
}
