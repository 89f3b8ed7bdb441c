//! The server and the per-caller handles dialed from it.

use crate::access::AccessResolver;
use crate::content::ContentLocator;
use crate::glob::{self, Expand};
use crate::listing::DirectoryLister;
use crate::mapper::PathMapper;
use crate::permission::PermissionEvaluator;
use crate::reader::LocalFileReader;
use crate::synth::EntrySynthesizer;
use localns_cache::{CacheStatistics, EntryCache};
use localns_config::ServerConfig;
use localns_core::{Entry, Error, ParsedPath, Refdata, Result, ResultExt, Right, UserName};
use localns_security::{AccessFileParser, EntrySigner, Policy, PolicyParser};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// State shared by every dialed handle
struct Shared {
    config: ServerConfig,
    mapper: PathMapper,
    cache: EntryCache,
    signer: Arc<dyn EntrySigner>,
    parser: Arc<dyn PolicyParser>,
    default_policy: Arc<dyn Policy>,
}

/// A read-only server for one local root.
///
/// Cloning is cheap; clones share the entry cache.
#[derive(Clone)]
pub struct Server {
    shared: Arc<Shared>,
}

impl Server {
    /// Serve `config.root` with the default policy file parser
    pub fn new(config: ServerConfig, signer: Arc<dyn EntrySigner>) -> Result<Self> {
        let parser = Arc::new(AccessFileParser::new(config.policy_file_name.clone()));
        Self::with_parser(config, signer, parser)
    }

    pub fn with_parser(
        mut config: ServerConfig,
        signer: Arc<dyn EntrySigner>,
        parser: Arc<dyn PolicyParser>,
    ) -> Result<Self> {
        config.validate()?;
        config.root = clean(&config.root);
        if !config.root.is_absolute() {
            return Err(Error::invalid(
                "root",
                format!("{} is not an absolute path", config.root.display()),
            ));
        }
        let meta = fs::metadata(&config.root).map_err(|e| Error::io(&config.root, "stat", e))?;
        if !meta.is_dir() {
            return Err(Error::invalid(
                "root",
                format!("{} is not a directory", config.root.display()),
            ));
        }

        let mapper = PathMapper::new(config.root.clone(), config.owner.clone());
        let cache = EntryCache::new(config.cache_capacity)?;
        let default_policy = parser.default_policy(&config.owner)?;

        tracing::info!(
            root = %config.root.display(),
            owner = %config.owner,
            capacity = config.cache_capacity,
            "serving local tree"
        );
        Ok(Server {
            shared: Arc::new(Shared {
                config,
                mapper,
                cache,
                signer,
                parser,
                default_policy,
            }),
        })
    }

    /// A directory handle acting for `user`
    pub fn dial_dir(&self, user: UserName) -> DirHandle<'_> {
        DirHandle {
            shared: &self.shared,
            user,
        }
    }

    /// A store handle acting for `user`
    pub fn dial_store(&self, user: UserName) -> StoreHandle<'_> {
        StoreHandle {
            shared: &self.shared,
            user,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.shared.cache.statistics()
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("root", &self.shared.config.root)
            .field("owner", &self.shared.config.owner)
            .field("cache", &self.shared.cache)
            .finish_non_exhaustive()
    }
}

// Lexical cleanup: drops `.` and resolves `..` without touching the disk.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

impl Shared {
    fn reader(&self) -> LocalFileReader<'_> {
        LocalFileReader::new(&self.mapper)
    }

    fn resolver(&self) -> AccessResolver<'_> {
        AccessResolver::new(&self.mapper, &self.config.policy_file_name)
    }

    fn permissions<'r>(
        &'r self,
        reader: &'r LocalFileReader<'r>,
        user: &'r UserName,
    ) -> PermissionEvaluator<'r> {
        PermissionEvaluator::new(
            self.resolver(),
            reader,
            self.parser.as_ref(),
            &self.default_policy,
            user,
        )
    }

    fn synthesizer(&self) -> EntrySynthesizer<'_> {
        EntrySynthesizer::new(
            &self.mapper,
            &self.cache,
            self.signer.as_ref(),
            &self.config.store_endpoint,
        )
    }

    fn parse(&self, name: &str) -> Result<ParsedPath> {
        let parsed = ParsedPath::parse(name)?;
        self.mapper.verify_owner(&parsed)?;
        Ok(parsed)
    }
}

/// Directory operations on behalf of one caller
pub struct DirHandle<'a> {
    shared: &'a Shared,
    user: UserName,
}

impl DirHandle<'_> {
    pub fn user(&self) -> &UserName {
        &self.user
    }

    /// The entry for `name`.
    ///
    /// Needs the list right; without the read right the entry comes back
    /// incomplete.
    pub fn lookup(&self, name: &str) -> Result<Entry> {
        self.shared
            .parse(name)
            .and_then(|parsed| Expand::lookup(self, &parsed))
            .op("dir/Lookup")
    }

    /// Entries directly inside the directory `name`
    pub fn list_dir(&self, name: &str) -> Result<Vec<Entry>> {
        self.shared
            .parse(name)
            .and_then(|parsed| Expand::list(self, &parsed))
            .op("dir/List")
    }

    /// Entries matching a pattern whose elements may hold `*`, `?` and `[...]`
    pub fn glob(&self, pattern: &str) -> Result<Vec<Entry>> {
        self.shared
            .parse(pattern)
            .and_then(|parsed| glob::expand(self, &parsed))
            .op("dir/Glob")
    }

    /// The entry of the policy file governing `name`, or `None` when the
    /// default policy applies
    pub fn which_access(&self, name: &str) -> Result<Option<Entry>> {
        self.which_access_inner(name).op("dir/WhichAccess")
    }

    fn which_access_inner(&self, name: &str) -> Result<Option<Entry>> {
        let parsed = self.shared.parse(name)?;
        let reader = self.shared.reader();
        let perms = self.shared.permissions(&reader, &self.user);
        if !perms.can(Right::AnyRight, &parsed)? {
            return Err(Error::permission(
                parsed.path().as_str(),
                format!("{} holds no rights", self.user),
            ));
        }

        let Some(policy) = perms.resolver().resolve(&parsed)? else {
            return Ok(None);
        };
        let local = self.shared.mapper.to_local(&policy.parse()?);
        let entry = self.shared.synthesizer().synthesize(&local)?;
        Ok(Some(Entry::clone(&entry)))
    }

    /// Change notification is not offered: the tree is static
    pub fn watch(&self, _name: &str) -> Result<()> {
        Err(Error::unsupported("watch")).op("dir/Watch")
    }

    pub fn put(&self, _entry: &Entry) -> Result<Entry> {
        Err(Error::ReadOnly).op("dir/Put")
    }

    pub fn delete(&self, _name: &str) -> Result<Entry> {
        Err(Error::ReadOnly).op("dir/Delete")
    }
}

impl Expand for DirHandle<'_> {
    fn lookup(&self, parsed: &ParsedPath) -> Result<Entry> {
        let reader = self.shared.reader();
        let perms = self.shared.permissions(&reader, &self.user);
        if !perms.can(Right::List, parsed)? {
            return Err(Error::private(parsed.path().as_str()));
        }

        let local = self.shared.mapper.to_local(parsed);
        let entry = self.shared.synthesizer().synthesize(&local)?;
        let mut entry = Entry::clone(&entry);
        if !perms.can(Right::Read, parsed)? {
            entry.mark_incomplete();
        }
        Ok(entry)
    }

    fn list(&self, parsed: &ParsedPath) -> Result<Vec<Entry>> {
        let reader = self.shared.reader();
        let perms = self.shared.permissions(&reader, &self.user);
        let synth = self.shared.synthesizer();
        DirectoryLister::new(&self.shared.mapper, &synth, &perms).list(parsed)
    }
}

/// Store operations on behalf of one caller
pub struct StoreHandle<'a> {
    shared: &'a Shared,
    user: UserName,
}

impl StoreHandle<'_> {
    pub fn user(&self) -> &UserName {
        &self.user
    }

    /// The bytes named by a composite reference, with caching metadata
    pub fn get(&self, reference: &str) -> Result<(Vec<u8>, Refdata)> {
        let reader = self.shared.reader();
        let perms = self.shared.permissions(&reader, &self.user);
        ContentLocator::new(&self.shared.mapper, &reader, &perms)
            .get(reference)
            .op("store/Get")
    }

    pub fn put(&self, _data: &[u8]) -> Result<Refdata> {
        Err(Error::ReadOnly).op("store/Put")
    }

    pub fn delete(&self, _reference: &str) -> Result<()> {
        Err(Error::ReadOnly).op("store/Delete")
    }
}
