//! Wildcard expansion over the one-level primitives.

use globset::{GlobBuilder, GlobMatcher};
use localns_core::{Entry, Error, ErrorKind, ParsedPath, Result};

/// The two primitives expansion is built from
pub(crate) trait Expand {
    fn lookup(&self, parsed: &ParsedPath) -> Result<Entry>;
    fn list(&self, parsed: &ParsedPath) -> Result<Vec<Entry>>;
}

fn is_meta(elem: &str) -> bool {
    elem.contains(['*', '?', '['])
}

fn matcher(elem: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(elem)
        .literal_separator(true)
        .build()
        .map_err(|e| Error::invalid(elem, e.to_string()))?;
    Ok(glob.compile_matcher())
}

// Below the first expanded level a branch the caller cannot see is dropped.
fn skippable(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Private | ErrorKind::Permission | ErrorKind::NotExist
    )
}

fn last_elem(entry: &Entry) -> &str {
    entry
        .name
        .as_str()
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Entries matching `pattern`, sorted by name.
///
/// A pattern without metacharacters is a plain lookup; a missing name
/// yields no entries rather than an error.
pub(crate) fn expand(source: &dyn Expand, pattern: &ParsedPath) -> Result<Vec<Entry>> {
    let Some(first_meta) = pattern.elems().iter().position(|e| is_meta(e)) else {
        return match source.lookup(pattern) {
            Ok(entry) => Ok(vec![entry]),
            Err(e) if e.is(ErrorKind::NotExist) => Ok(Vec::new()),
            Err(e) => Err(e),
        };
    };

    let nelem = pattern.nelem();
    let mut dirs = vec![pattern.first(first_meta)];
    let mut found = Vec::new();

    for (level, elem) in pattern.elems().iter().enumerate().skip(first_meta) {
        let last = level + 1 == nelem;
        let nested = level > first_meta;
        let mut next = Vec::new();

        if is_meta(elem) {
            let m = matcher(elem)?;
            for dir in &dirs {
                let children = match source.list(dir) {
                    Ok(children) => children,
                    Err(e) if nested && skippable(&e) => {
                        tracing::trace!(dir = %dir, error = %e, "glob branch skipped");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for child in children {
                    let name = last_elem(&child);
                    if !m.is_match(name) {
                        continue;
                    }
                    if last {
                        found.push(child);
                    } else if child.is_dir() {
                        next.push(dir.join(name)?);
                    }
                }
            }
        } else {
            for dir in &dirs {
                let child = dir.join(elem)?;
                if !last {
                    next.push(child);
                    continue;
                }
                match source.lookup(&child) {
                    Ok(entry) => found.push(entry),
                    Err(e) if skippable(&e) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        dirs = next;
    }

    found.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
    tracing::debug!(pattern = %pattern, matches = found.len(), "glob expanded");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use localns_core::{Attribute, Packing, SignatureBuf, UserName, Version};
    use std::collections::{BTreeMap, HashSet};

    /// An in-memory tree: directory path to (child name, is_dir)
    #[derive(Default)]
    struct Tree {
        dirs: BTreeMap<String, Vec<(&'static str, bool)>>,
        private: HashSet<String>,
    }

    fn entry(name: String, is_dir: bool) -> Entry {
        Entry {
            signed_name: name.clone().into(),
            name: name.into(),
            link: None,
            attr: if is_dir {
                Attribute::Directory
            } else {
                Attribute::None
            },
            packing: Packing::Plain,
            version: Version::new(1, 0),
            writer: UserName::new("u").unwrap(),
            content: None,
            signature: SignatureBuf::zeroed(),
            complete: true,
        }
    }

    impl Expand for Tree {
        fn lookup(&self, parsed: &ParsedPath) -> Result<Entry> {
            let name = parsed.path().to_string();
            if self.dirs.contains_key(&name) {
                return Ok(entry(name, true));
            }
            let parent = parsed.drop(1).path().to_string();
            let is_file = self
                .dirs
                .get(&parent)
                .is_some_and(|c| c.iter().any(|(n, d)| !d && Some(*n) == parsed.last()));
            if is_file {
                Ok(entry(name, false))
            } else {
                Err(Error::not_exist(name))
            }
        }

        fn list(&self, parsed: &ParsedPath) -> Result<Vec<Entry>> {
            let name = parsed.path().to_string();
            if self.private.contains(&name) {
                return Err(Error::private(name));
            }
            let children = self
                .dirs
                .get(&name)
                .ok_or_else(|| Error::not_exist(name.clone()))?;
            Ok(children
                .iter()
                .map(|(n, d)| entry(parsed.join(n).unwrap().path().to_string(), *d))
                .collect())
        }
    }

    fn tree() -> Tree {
        let mut t = Tree::default();
        t.dirs
            .insert("u/".into(), vec![("a", true), ("b", true), ("notes.txt", false)]);
        t.dirs
            .insert("u/a".into(), vec![("x.txt", false), ("y.md", false)]);
        t.dirs.insert("u/b".into(), vec![("x.txt", false)]);
        t
    }

    fn names(t: &Tree, pattern: &str) -> Result<Vec<String>> {
        let parsed = ParsedPath::parse(pattern).unwrap();
        Ok(expand(t, &parsed)?
            .into_iter()
            .map(|e| e.name.to_string())
            .collect())
    }

    #[test]
    fn test_literal_pattern_is_a_lookup() {
        let t = tree();
        assert_eq!(names(&t, "u/a/x.txt").unwrap(), ["u/a/x.txt"]);
        assert!(names(&t, "u/a/missing").unwrap().is_empty());
    }

    #[test]
    fn test_single_level() {
        let t = tree();
        assert_eq!(names(&t, "u/*").unwrap(), ["u/a", "u/b", "u/notes.txt"]);
        assert_eq!(names(&t, "u/a/*.txt").unwrap(), ["u/a/x.txt"]);
        assert_eq!(names(&t, "u/[ab]").unwrap(), ["u/a", "u/b"]);
    }

    #[test]
    fn test_multi_level() {
        let t = tree();
        assert_eq!(names(&t, "u/*/x.txt").unwrap(), ["u/a/x.txt", "u/b/x.txt"]);
        assert_eq!(names(&t, "u/*/*").unwrap(), ["u/a/x.txt", "u/a/y.md", "u/b/x.txt"]);
    }

    #[test]
    fn test_private_branches() {
        let mut t = tree();
        t.private.insert("u/b".into());
        assert_eq!(names(&t, "u/*/*").unwrap(), ["u/a/x.txt", "u/a/y.md"]);

        t.private.insert("u/".into());
        let err = names(&t, "u/*").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Private);
    }

    #[test]
    fn test_bad_pattern() {
        let t = tree();
        let err = names(&t, "u/[a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }
}
