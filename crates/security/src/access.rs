//! Access policy files.
//!
//! The server only asks "may this principal exercise this right on this
//! path"; the traits here are that boundary. [`AccessFile`] is the policy
//! format served by default:
//!
//! ```text
//! # comments run to end of line
//! read, list: ann@example.com, family/Group/kids
//! *: owner@example.com
//! list: all
//! ```
//!
//! A principal containing a slash names a group file, read through the
//! [`FileReader`] and holding one principal per line or comma separated.

use localns_core::{Error, ParsedPath, PathName, Result, Right, UserName};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Nested group files beyond this depth are rejected
const MAX_GROUP_DEPTH: usize = 8;

/// Reads logical files on behalf of policy evaluation
pub trait FileReader: Send + Sync {
    fn read_file(&self, name: &PathName) -> Result<Vec<u8>>;
}

/// An evaluated access policy
pub trait Policy: Send + Sync {
    fn can(
        &self,
        user: &UserName,
        right: Right,
        path: &PathName,
        reader: &dyn FileReader,
    ) -> Result<bool>;
}

/// Turns policy file bytes into a [`Policy`]
pub trait PolicyParser: Send + Sync {
    fn parse(&self, name: &PathName, data: &[u8]) -> Result<Arc<dyn Policy>>;

    /// The policy applied where no policy file exists
    fn default_policy(&self, owner: &UserName) -> Result<Arc<dyn Policy>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Principal {
    All,
    User(UserName),
    Group(PathName),
}

impl Principal {
    fn parse(token: &str) -> std::result::Result<Self, String> {
        if token.eq_ignore_ascii_case("all") {
            return Ok(Principal::All);
        }
        if token.contains('/') {
            let parsed = ParsedPath::parse(token).map_err(|e| e.to_string())?;
            return Ok(Principal::Group(parsed.path()));
        }
        UserName::new(token)
            .map(Principal::User)
            .map_err(|e| e.to_string())
    }
}

/// A parsed policy file
#[derive(Debug, Clone)]
pub struct AccessFile {
    name: PathName,
    grants: HashMap<Right, Vec<Principal>>,
}

impl AccessFile {
    /// Grants every right to `owner` and nothing to anyone else
    pub fn default_for(owner: &UserName, file_name: &str) -> Self {
        let grants = Right::ALL
            .iter()
            .map(|r| (*r, vec![Principal::User(owner.clone())]))
            .collect();
        AccessFile {
            name: PathName::new(format!("{owner}/{file_name}")),
            grants,
        }
    }

    pub fn parse(name: &PathName, data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::policy(name.as_str(), 0, format!("not UTF-8: {e}")))?;

        let mut grants: HashMap<Right, Vec<Principal>> = HashMap::new();
        for (i, raw) in text.lines().enumerate() {
            let lineno = i + 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            let (rights, principals) = line.split_once(':').ok_or_else(|| {
                Error::policy(name.as_str(), lineno, "expected 'rights: principals'")
            })?;

            let rights = parse_rights(rights)
                .map_err(|m| Error::policy(name.as_str(), lineno, m))?;
            let principals = tokens(principals)
                .map(Principal::parse)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|m| Error::policy(name.as_str(), lineno, m))?;
            if principals.is_empty() {
                return Err(Error::policy(name.as_str(), lineno, "no principals"));
            }

            for right in rights {
                grants
                    .entry(right)
                    .or_default()
                    .extend(principals.iter().cloned());
            }
        }

        Ok(AccessFile {
            name: name.clone(),
            grants,
        })
    }

    pub fn name(&self) -> &PathName {
        &self.name
    }

    fn granted(&self, user: &UserName, right: Right, reader: &dyn FileReader) -> Result<bool> {
        let Some(principals) = self.grants.get(&right) else {
            return Ok(false);
        };
        for p in principals {
            let hit = match p {
                Principal::All => true,
                Principal::User(u) => u == user,
                Principal::Group(g) => in_group(user, g, reader, 0, &mut HashSet::new())?,
            };
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Policy for AccessFile {
    fn can(
        &self,
        user: &UserName,
        right: Right,
        path: &PathName,
        reader: &dyn FileReader,
    ) -> Result<bool> {
        let allowed = match right {
            Right::AnyRight => {
                let mut any = false;
                for r in Right::ALL {
                    if self.granted(user, r, reader)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            r => self.granted(user, r, reader)?,
        };
        tracing::trace!(
            policy = %self.name,
            %user,
            %right,
            %path,
            allowed,
            "policy evaluated"
        );
        Ok(allowed)
    }
}

/// The default [`PolicyParser`], reading [`AccessFile`]s
#[derive(Debug, Clone)]
pub struct AccessFileParser {
    file_name: String,
}

impl AccessFileParser {
    pub fn new(file_name: impl Into<String>) -> Self {
        AccessFileParser {
            file_name: file_name.into(),
        }
    }
}

impl PolicyParser for AccessFileParser {
    fn parse(&self, name: &PathName, data: &[u8]) -> Result<Arc<dyn Policy>> {
        Ok(Arc::new(AccessFile::parse(name, data)?))
    }

    fn default_policy(&self, owner: &UserName) -> Result<Arc<dyn Policy>> {
        Ok(Arc::new(AccessFile::default_for(owner, &self.file_name)))
    }
}

fn in_group(
    user: &UserName,
    group: &PathName,
    reader: &dyn FileReader,
    depth: usize,
    seen: &mut HashSet<PathName>,
) -> Result<bool> {
    if depth >= MAX_GROUP_DEPTH {
        return Err(Error::policy(group.as_str(), 0, "group nesting too deep"));
    }
    if !seen.insert(group.clone()) {
        return Ok(false);
    }

    let data = reader.read_file(group)?;
    let text = std::str::from_utf8(&data)
        .map_err(|e| Error::policy(group.as_str(), 0, format!("not UTF-8: {e}")))?;
    for (i, raw) in text.lines().enumerate() {
        for token in tokens(strip_comment(raw)) {
            let member = Principal::parse(token)
                .map_err(|m| Error::policy(group.as_str(), i + 1, m))?;
            let hit = match &member {
                Principal::All => true,
                Principal::User(u) => u == user,
                Principal::Group(g) => in_group(user, g, reader, depth + 1, seen)?,
            };
            if hit {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

fn parse_rights(s: &str) -> std::result::Result<Vec<Right>, String> {
    let mut rights = Vec::new();
    for token in tokens(s) {
        if token == "*" || token.eq_ignore_ascii_case("all") {
            rights.extend(Right::ALL);
        } else {
            rights.push(token.parse::<Right>().map_err(|e| e.to_string())?);
        }
    }
    if rights.is_empty() {
        return Err("no rights".to_string());
    }
    Ok(rights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use localns_core::ErrorKind;

    /// Serves group files from memory
    struct Groups(HashMap<String, &'static str>);

    impl FileReader for Groups {
        fn read_file(&self, name: &PathName) -> Result<Vec<u8>> {
            self.0
                .get(name.as_str())
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| Error::not_exist(name.as_str()))
        }
    }

    fn no_groups() -> Groups {
        Groups(HashMap::new())
    }

    fn user(name: &str) -> UserName {
        UserName::new(name).unwrap()
    }

    fn path() -> PathName {
        PathName::from("owner/dir/file")
    }

    #[test]
    fn test_parse_and_evaluate() {
        let acl = AccessFile::parse(
            &PathName::from("owner/Access"),
            b"# policy\nread, list: ann, bob\nlist: all\n*: owner # everything\n",
        )
        .unwrap();
        let r = no_groups();

        assert!(acl.can(&user("ann"), Right::Read, &path(), &r).unwrap());
        assert!(!acl.can(&user("ann"), Right::Write, &path(), &r).unwrap());
        assert!(acl.can(&user("zed"), Right::List, &path(), &r).unwrap());
        assert!(!acl.can(&user("zed"), Right::Read, &path(), &r).unwrap());
        assert!(acl.can(&user("owner"), Right::Delete, &path(), &r).unwrap());
        assert!(acl.can(&user("zed"), Right::AnyRight, &path(), &r).unwrap());
    }

    #[test]
    fn test_default_policy_grants_owner_only() {
        let acl = AccessFile::default_for(&user("owner"), "Access");
        let r = no_groups();
        for right in Right::ALL {
            assert!(acl.can(&user("owner"), right, &path(), &r).unwrap());
            assert!(!acl.can(&user("ann"), right, &path(), &r).unwrap());
        }
        assert!(!acl.can(&user("ann"), Right::AnyRight, &path(), &r).unwrap());
        assert_eq!(acl.name().as_str(), "owner/Access");
    }

    #[test]
    fn test_group_membership() {
        let acl = AccessFile::parse(
            &PathName::from("owner/Access"),
            b"read: owner/Group/friends\n",
        )
        .unwrap();
        let groups = Groups(HashMap::from([
            ("owner/Group/friends".to_string(), "ann, owner/Group/close\n"),
            ("owner/Group/close".to_string(), "bob\n# cal\nowner/Group/friends"),
        ]));

        assert!(acl.can(&user("ann"), Right::Read, &path(), &groups).unwrap());
        assert!(acl.can(&user("bob"), Right::Read, &path(), &groups).unwrap());
        assert!(!acl.can(&user("cal"), Right::Read, &path(), &groups).unwrap());
    }

    #[test]
    fn test_missing_group_propagates() {
        let acl =
            AccessFile::parse(&PathName::from("owner/Access"), b"read: owner/Group/gone").unwrap();
        let err = acl
            .can(&user("ann"), Right::Read, &path(), &no_groups())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotExist);
    }

    #[test]
    fn test_parse_errors() {
        let name = PathName::from("owner/Access");
        let cases: [&[u8]; 6] = [
            b"read ann",
            b"fly: ann",
            b"read:",
            b": ann",
            b"read: bad/../path",
            b"\xff\xfe",
        ];
        for bad in cases {
            let err = AccessFile::parse(&name, bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Invalid, "{bad:?}");
        }
    }
}
