//! Deciding whether a user holds a right on a path.

use crate::access::AccessResolver;
use localns_core::{ParsedPath, Result, Right, UserName};
use localns_security::{FileReader, Policy, PolicyParser};
use std::sync::Arc;

/// Evaluates rights for one user.
///
/// The governing policy file is found and parsed again on every check.
pub struct PermissionEvaluator<'a> {
    resolver: AccessResolver<'a>,
    reader: &'a dyn FileReader,
    parser: &'a dyn PolicyParser,
    default_policy: &'a Arc<dyn Policy>,
    user: &'a UserName,
}

impl<'a> PermissionEvaluator<'a> {
    pub fn new(
        resolver: AccessResolver<'a>,
        reader: &'a dyn FileReader,
        parser: &'a dyn PolicyParser,
        default_policy: &'a Arc<dyn Policy>,
        user: &'a UserName,
    ) -> Self {
        PermissionEvaluator {
            resolver,
            reader,
            parser,
            default_policy,
            user,
        }
    }

    pub fn user(&self) -> &UserName {
        self.user
    }

    pub fn resolver(&self) -> &AccessResolver<'a> {
        &self.resolver
    }

    pub fn can(&self, right: Right, parsed: &ParsedPath) -> Result<bool> {
        let path = parsed.path();
        let allowed = match self.resolver.resolve(parsed)? {
            None => self.default_policy.can(self.user, right, &path, self.reader)?,
            Some(policy_name) => {
                let data = self.reader.read_file(&policy_name)?;
                let policy = self.parser.parse(&policy_name, &data)?;
                policy.can(self.user, right, &path, self.reader)?
            }
        };
        tracing::trace!(user = %self.user, %right, %path, allowed, "permission check");
        Ok(allowed)
    }
}
