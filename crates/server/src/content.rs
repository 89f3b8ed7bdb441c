//! Serving the bytes behind composite content references.

use crate::mapper::PathMapper;
use crate::permission::PermissionEvaluator;
use localns_core::{
    CompositeRef, Error, ParsedPath, PathName, Refdata, Result, Right, REFDATA_DURATION_SECS,
};
use localns_security::FileReader;
use std::time::Duration;

/// The logical name of the segment holding the block at `offset`.
///
/// Offset zero is the file itself; later blocks live beside it as
/// `<file>-<offset>`.
pub fn segment_name(parsed: &ParsedPath, offset: u64) -> PathName {
    if offset == 0 {
        parsed.path()
    } else {
        PathName::new(format!("{}-{offset}", parsed.path()))
    }
}

/// Resolves references for one caller and reads the segments they name
pub struct ContentLocator<'a> {
    mapper: &'a PathMapper,
    reader: &'a dyn FileReader,
    perms: &'a PermissionEvaluator<'a>,
}

impl<'a> ContentLocator<'a> {
    pub fn new(
        mapper: &'a PathMapper,
        reader: &'a dyn FileReader,
        perms: &'a PermissionEvaluator<'a>,
    ) -> Self {
        ContentLocator {
            mapper,
            reader,
            perms,
        }
    }

    /// The logical file a reference points into, checked for the read right
    pub fn locate(&self, reference: &CompositeRef) -> Result<ParsedPath> {
        let parsed = ParsedPath::parse(&format!(
            "{}/{}",
            self.mapper.owner(),
            reference.relative_path()
        ))?;
        if !self.perms.can(Right::Read, &parsed)? {
            return Err(Error::permission(
                parsed.path().as_str(),
                format!("{} may not read", self.perms.user()),
            ));
        }
        Ok(parsed)
    }

    pub fn get(&self, reference: &str) -> Result<(Vec<u8>, Refdata)> {
        let decoded = CompositeRef::decode(reference)?;
        let parsed = self.locate(&decoded)?;
        let segment = segment_name(&parsed, decoded.offset());
        let data = self.reader.read_file(&segment)?;

        tracing::debug!(%reference, %segment, len = data.len(), "content served");
        Ok((
            data,
            Refdata {
                reference: reference.to_string(),
                volatile: false,
                duration: Duration::from_secs(REFDATA_DURATION_SECS),
            },
        ))
    }
}
