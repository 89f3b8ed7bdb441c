//! Composite content references.
//!
//! A reference names one stored block as `<relative path>-<offset>`. The
//! offset is always the last hyphen-separated token, so the relative path
//! itself may contain hyphens.

use crate::errors::{Error, Result};
use serde::Serialize;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeRef {
    relative_path: String,
    offset: u64,
}

impl CompositeRef {
    pub fn new(relative_path: impl Into<String>, offset: u64) -> Self {
        CompositeRef {
            relative_path: relative_path.into(),
            offset,
        }
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn decode(reference: &str) -> Result<Self> {
        let (path, offset) = reference.rsplit_once('-').ok_or_else(|| {
            Error::invalid("reference", format!("{reference:?}: missing offset"))
        })?;
        if path.is_empty() {
            return Err(Error::invalid(
                "reference",
                format!("{reference:?}: empty path"),
            ));
        }
        if offset.is_empty() || !offset.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid(
                "reference",
                format!("{reference:?}: offset must be decimal digits"),
            ));
        }
        let offset = offset.parse::<u64>().map_err(|e| {
            Error::invalid("reference", format!("{reference:?}: bad offset: {e}"))
        })?;
        Ok(CompositeRef::new(path, offset))
    }
}

impl Display for CompositeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.relative_path, self.offset)
    }
}

impl FromStr for CompositeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Metadata returned alongside stored bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refdata {
    pub reference: String,
    /// Whether the bytes behind the reference may change
    pub volatile: bool,
    /// How long a client may cache the bytes
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn hyphenated_paths_round_trip() {
        let r = CompositeRef::new("a/b-c", 42);
        assert_eq!(r.encode(), "a/b-c-42");
        let back = CompositeRef::decode("a/b-c-42").unwrap();
        assert_eq!(back.relative_path(), "a/b-c");
        assert_eq!(back.offset(), 42);
    }

    #[test]
    fn malformed_references_are_invalid() {
        for bad in [
            "nohyphen",
            "-12",
            "a/b-",
            "a/b-x1",
            "a-+1",
            "a- 1",
            "a-18446744073709551616",
        ] {
            let err = CompositeRef::decode(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Invalid, "{bad:?}");
        }
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(path in "[a-z0-9/_.-]{0,20}[a-z0-9]", offset in any::<u64>()) {
            let r = CompositeRef::new(path.clone(), offset);
            let back: CompositeRef = r.encode().parse().unwrap();
            prop_assert_eq!(back.relative_path(), path.as_str());
            prop_assert_eq!(back.offset(), offset);
        }
    }
}
