//! Building signed entries from local file metadata.

use crate::mapper::PathMapper;
use localns_cache::{EntryCache, Lookup};
use localns_core::{
    Attribute, ContentRef, Entry, Error, Packing, Result, SignatureBuf, Version,
};
use localns_security::{CanonicalFields, EntrySigner};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Produces signed entries for local paths, caching file entries by
/// modification time.
pub struct EntrySynthesizer<'a> {
    mapper: &'a PathMapper,
    cache: &'a EntryCache,
    signer: &'a dyn EntrySigner,
    store_endpoint: &'a str,
}

impl<'a> EntrySynthesizer<'a> {
    pub fn new(
        mapper: &'a PathMapper,
        cache: &'a EntryCache,
        signer: &'a dyn EntrySigner,
        store_endpoint: &'a str,
    ) -> Self {
        EntrySynthesizer {
            mapper,
            cache,
            signer,
            store_endpoint,
        }
    }

    /// The complete, signed entry for `local`.
    ///
    /// Directories are signed afresh on every call. File entries are served
    /// from the cache while the file's modification time is unchanged.
    pub fn synthesize(&self, local: &Path) -> Result<Arc<Entry>> {
        let name = self.mapper.to_logical(local)?;
        let meta = fs::symlink_metadata(local).map_err(|e| Error::io(local, "stat", e))?;
        if meta.file_type().is_symlink() {
            return Err(Error::invalid(name.as_str(), "symbolic links are not served"));
        }
        let modified = meta.modified().map_err(|e| Error::io(local, "stat", e))?;
        let version = Version::from_system_time(modified);

        if meta.is_dir() {
            let entry = self.sign(Entry {
                name: name.clone(),
                signed_name: name,
                link: None,
                attr: Attribute::Directory,
                packing: Packing::Plain,
                version,
                writer: self.mapper.owner().clone(),
                content: None,
                signature: SignatureBuf::zeroed(),
                complete: true,
            })?;
            return Ok(Arc::new(entry));
        }
        if !meta.is_file() {
            return Err(Error::invalid(
                name.as_str(),
                "not a regular file or directory",
            ));
        }

        if let Lookup::Fresh(entry) = self.cache.lookup(local, version) {
            tracing::debug!(path = %name, "entry cache hit");
            return Ok(entry);
        }

        let content = ContentRef {
            location: self.store_endpoint.to_string(),
            relative_path: self.mapper.relative(local)?,
            offset: 0,
            size: meta.len(),
        };
        let entry = Arc::new(self.sign(Entry {
            name: name.clone(),
            signed_name: name,
            link: None,
            attr: Attribute::None,
            packing: Packing::Plain,
            version,
            writer: self.mapper.owner().clone(),
            content: Some(content),
            signature: SignatureBuf::zeroed(),
            complete: true,
        })?);
        self.cache.insert(local.to_path_buf(), Arc::clone(&entry));

        tracing::debug!(path = %entry.name, size = entry.size(), "entry synthesized");
        Ok(entry)
    }

    fn sign(&self, mut entry: Entry) -> Result<Entry> {
        let hash = CanonicalFields::of(&entry).hash();
        entry.signature = self.signer.sign(&hash)?.pack();
        Ok(entry)
    }
}
