//! End-to-end behaviour of a server over a temporary tree.

use ed25519_dalek::SigningKey;
use localns_config::ServerConfig;
use localns_core::{CompositeRef, ErrorKind, UserName};
use localns_security::{verify_entry, EntrySigner, Factotum};
use localns_server::Server;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    factotum: Arc<Factotum>,
    server: Server,
}

impl Fixture {
    fn new() -> Self {
        Self::with_factotum(Factotum::generate())
    }

    fn with_factotum(factotum: Factotum) -> Self {
        let dir = TempDir::new().unwrap();
        let factotum = Arc::new(factotum);
        let config = ServerConfig::builder(dir.path(), user("u"))
            .with_cache_capacity(64)
            .build()
            .unwrap();
        let signer: Arc<dyn EntrySigner> = factotum.clone();
        let server = Server::new(config, signer).unwrap();
        Fixture {
            dir,
            factotum,
            server,
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, data: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, data).unwrap();
        set_mode(&path, 0o644);
    }
}

fn user(name: &str) -> UserName {
    UserName::new(name).unwrap()
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

#[test]
fn lookup_and_read_back() {
    let fx = Fixture::new();
    fx.write("doc", "hello");

    let dir = fx.server.dial_dir(user("u"));
    let entry = dir.lookup("u/doc").unwrap();
    assert_eq!(entry.name.as_str(), "u/doc");
    assert_eq!(entry.size(), 5);
    assert!(entry.complete);
    assert_eq!(entry.writer.as_str(), "u");
    verify_entry(&entry, &fx.factotum.verifying_key()).unwrap();

    let reference = entry.content.as_ref().unwrap().reference().encode();
    assert_eq!(reference, "doc-0");
    let store = fx.server.dial_store(user("u"));
    let (data, refdata) = store.get(&reference).unwrap();
    assert_eq!(data, b"hello");
    assert_eq!(refdata.duration, Duration::from_secs(60));
    assert!(!refdata.volatile);
}

#[test]
fn mutations_are_read_only() {
    let fx = Fixture::new();
    fx.write("doc", "hello");
    let dir = fx.server.dial_dir(user("u"));
    let entry = dir.lookup("u/doc").unwrap();

    assert_eq!(dir.put(&entry).unwrap_err().kind(), ErrorKind::ReadOnly);
    assert_eq!(dir.delete("u/doc").unwrap_err().kind(), ErrorKind::ReadOnly);

    let store = fx.server.dial_store(user("u"));
    assert_eq!(store.put(b"data").unwrap_err().kind(), ErrorKind::ReadOnly);
    assert_eq!(store.delete("doc-0").unwrap_err().kind(), ErrorKind::ReadOnly);
    assert_eq!(dir.watch("u/").unwrap_err().kind(), ErrorKind::Unsupported);
}

#[test]
fn listing_redacts_unreadable_children() {
    let fx = Fixture::new();
    fx.write("d/Access", "list: all\nread: all");
    fx.write("d/a", "a");
    fx.write("d/b/Access", "list: all");
    fs::create_dir(fx.root().join("d/c")).unwrap();

    let entries = fx.server.dial_dir(user("v")).list_dir("u/d").unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["u/d/Access", "u/d/a", "u/d/b", "u/d/c"]);

    assert!(entries[1].complete);
    assert!(entries[1].content.is_some());
    assert!(!entries[2].complete);
    assert!(entries[2].signature.is_zero());
    assert!(entries[3].complete);
    assert!(entries[3].is_dir());
}

#[test]
fn listing_without_list_right_is_private() {
    let fx = Fixture::new();
    fx.write("d/a", "a");
    let err = fx.server.dial_dir(user("v")).list_dir("u/d").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Private);
    assert!(err.to_string().starts_with("dir/List: "));
}

#[test]
fn lookup_without_read_right_is_incomplete() {
    let fx = Fixture::new();
    fx.write("Access", "list: all\n*: u");
    fx.write("doc", "hello");

    let entry = fx.server.dial_dir(user("v")).lookup("u/doc").unwrap();
    assert!(!entry.complete);
    assert!(entry.content.is_none());
    assert!(entry.signature.is_zero());

    let err = fx.server.dial_store(user("v")).get("doc-0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    fx.write("Access", "*: u");
    let err = fx.server.dial_dir(user("v")).lookup("u/doc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Private);
}

#[cfg(unix)]
#[test]
fn host_permissions_override_policy() {
    let fx = Fixture::new();
    fx.write("Access", "read, list: all");
    fx.write("secret", "key material");
    set_mode(&fx.root().join("secret"), 0o640);

    let err = fx
        .server
        .dial_store(user("v"))
        .get("secret-0")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    let err = fx.server.dial_store(user("u")).get("secret-0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);
}

#[test]
fn repeated_lookups_are_identical_until_modified() {
    let fx = Fixture::new();
    fx.write("doc", "hello");
    let dir = fx.server.dial_dir(user("u"));

    let first = dir.lookup("u/doc").unwrap();
    let second = dir.lookup("u/doc").unwrap();
    assert_eq!(first.version, second.version);
    assert_eq!(first.signature.as_bytes(), second.signature.as_bytes());
    assert_eq!(fx.server.cache_statistics().hits, 1);

    let later = SystemTime::now() + Duration::from_secs(30);
    fs::File::options()
        .write(true)
        .open(fx.root().join("doc"))
        .unwrap()
        .set_modified(later)
        .unwrap();

    let third = dir.lookup("u/doc").unwrap();
    assert!(third.version > first.version);
    assert_ne!(first.signature.as_bytes(), third.signature.as_bytes());
    verify_entry(&third, &fx.factotum.verifying_key()).unwrap();
    assert_eq!(fx.server.cache_statistics().stale_removals, 1);
}

#[test]
fn hyphenated_names_round_trip_through_references() {
    let fx = Fixture::new();
    fx.write("a/b-c", "first block");
    fx.write("a/b-c-11", "second block");

    let entry = fx.server.dial_dir(user("u")).lookup("u/a/b-c").unwrap();
    let content = entry.content.as_ref().unwrap();
    assert_eq!(content.relative_path, "a/b-c");

    let reference = content.reference().encode();
    assert_eq!(CompositeRef::decode(&reference).unwrap(), content.reference());

    let store = fx.server.dial_store(user("u"));
    assert_eq!(store.get(&reference).unwrap().0, b"first block");
    assert_eq!(store.get("a/b-c-11").unwrap().0, b"second block");
}

#[test]
fn which_access_names_the_governing_file() {
    let fx = Fixture::new();
    fx.write("a/b/doc", "x");
    let dir = fx.server.dial_dir(user("u"));
    assert!(dir.which_access("u/a/b/doc").unwrap().is_none());

    fx.write("a/Access", "read: all");
    let entry = dir.which_access("u/a/b/doc").unwrap().unwrap();
    assert_eq!(entry.name.as_str(), "u/a/Access");
    verify_entry(&entry, &fx.factotum.verifying_key()).unwrap();

    let err = fx
        .server
        .dial_dir(user("v"))
        .which_access("u/doc-free")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotExist);

    fx.write("other", "x");
    let err = fx
        .server
        .dial_dir(user("v"))
        .which_access("u/other")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);
}

#[test]
fn glob_expands_across_levels() {
    let fx = Fixture::new();
    fx.write("Access", "read, list: all");
    fx.write("a/x.txt", "1");
    fx.write("a/y.md", "2");
    fx.write("b/x.txt", "3");
    fx.write("b/Access", "read: all\nlist: u");

    let dir = fx.server.dial_dir(user("v"));
    let names = |pattern: &str| -> Vec<String> {
        dir.glob(pattern)
            .unwrap()
            .into_iter()
            .map(|e| e.name.to_string())
            .collect()
    };

    assert_eq!(names("u/a/*.txt"), ["u/a/x.txt"]);
    assert_eq!(names("u/*/x.txt"), ["u/a/x.txt"]);
    assert!(names("u/a/none").is_empty());

    let owner = fx.server.dial_dir(user("u"));
    let all: Vec<_> = owner
        .glob("u/*/x.txt")
        .unwrap()
        .into_iter()
        .map(|e| e.name.to_string())
        .collect();
    assert_eq!(all, ["u/a/x.txt", "u/b/x.txt"]);
}

#[test]
fn concurrent_callers_share_the_cache() {
    let fx = Fixture::new();
    fx.write("Access", "read, list: all");
    for i in 0..8 {
        fx.write(&format!("f{i}"), "payload");
    }

    std::thread::scope(|s| {
        for t in 0..8 {
            let server = &fx.server;
            s.spawn(move || {
                let dir = server.dial_dir(user(&format!("caller{t}")));
                for i in 0..8 {
                    let entry = dir.lookup(&format!("u/f{i}")).unwrap();
                    assert!(entry.complete);
                    assert_eq!(entry.size(), 7);
                }
            });
        }
    });

    let stats = fx.server.cache_statistics();
    assert_eq!(stats.len, 8);
    assert_eq!(stats.hits + stats.misses, 64);
}

#[test]
fn rotation_signatures_verify_under_both_keys() {
    let current = SigningKey::from_bytes(&[1u8; 32]);
    let previous = SigningKey::from_bytes(&[2u8; 32]);
    let fx = Fixture::with_factotum(Factotum::new(current).with_previous(previous));
    fx.write("doc", "hello");

    let entry = fx.server.dial_dir(user("u")).lookup("u/doc").unwrap();
    assert!(entry.signature.rotation().is_some());
    verify_entry(&entry, &fx.factotum.verifying_key()).unwrap();
    verify_entry(&entry, &fx.factotum.previous_verifying_key().unwrap()).unwrap();

    let stranger = SigningKey::from_bytes(&[3u8; 32]).verifying_key();
    assert!(verify_entry(&entry, &stranger).is_err());
}

#[test]
fn resolution_fails_on_missing_intermediate_directories() {
    let fx = Fixture::new();
    fx.write("Access", "read, list: all");
    let err = fx
        .server
        .dial_dir(user("u"))
        .lookup("u/missing/deeper/doc")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotExist);
}

#[cfg(unix)]
#[test]
fn symlinks_out_of_the_root_are_not_served() {
    let fx = Fixture::new();
    let outside = TempDir::new().unwrap();
    let host = outside.path().join("host");
    fs::write(&host, "outside-bytes").unwrap();
    set_mode(&host, 0o644);
    std::os::unix::fs::symlink(&host, fx.root().join("link")).unwrap();
    fx.write("doc", "hello");

    let dir = fx.server.dial_dir(user("u"));
    let err = dir.lookup("u/link").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    let err = fx.server.dial_store(user("u")).get("link-0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    let names: Vec<_> = dir
        .glob("u/*")
        .unwrap()
        .into_iter()
        .map(|e| e.name.to_string())
        .collect();
    assert_eq!(names, ["u/doc"]);
}
