//! Dependency references between packages
//!
//! A reference names a package by origin repository and path, optionally
//! followed by a version constraint:
//!
//! ```text
//! sys/log                 # package in the referring package's repository
//! @core/sys/log           # package in repository `core`
//! @core/sys/log>=1.2      # ... restricted to versions >= 1.2
//! sys/log ^1.0            # constraint separated by whitespace
//! ```

use crate::{PackageError, Result};
use semver::VersionReq;
use serde::Serialize;
use std::fmt;

const CONSTRAINT_START: &[char] = &['<', '>', '=', '~', '^'];

/// Repository-qualified package name; the membership key for packages and
/// dependencies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageId {
    pub repository: String,
    pub name: String,
}

impl PackageId {
    pub fn new(repository: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.repository, self.name)
    }
}

/// Parsed reference to another package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRef {
    pub repository: String,
    pub name: String,
    pub constraint: Option<VersionReq>,
}

impl DependencyRef {
    /// Parse a raw reference declared by a package living in `origin_repo`.
    ///
    /// References without an `@repo/` prefix inherit `origin_repo`.
    pub fn parse(origin_repo: &str, input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PackageError::invalid_reference(input, "empty reference"));
        }

        let (path, constraint) = split_constraint(trimmed);
        let constraint = match constraint {
            Some(req) => Some(VersionReq::parse(req).map_err(|e| {
                PackageError::invalid_reference(input, format!("bad version constraint: {e}"))
            })?),
            None => None,
        };

        let (repository, name) = match path.strip_prefix('@') {
            Some(qualified) => qualified.split_once('/').ok_or_else(|| {
                PackageError::invalid_reference(input, "missing package path after repository")
            })?,
            None => (origin_repo, path),
        };

        validate_segment(input, repository, "repository")?;
        for segment in name.split('/') {
            validate_segment(input, segment, "path")?;
        }

        Ok(Self {
            repository: repository.to_string(),
            name: name.to_string(),
            constraint,
        })
    }

    /// Membership key: two refs with the same repository and name are the
    /// same dependency regardless of constraint.
    pub fn id(&self) -> PackageId {
        PackageId::new(&self.repository, &self.name)
    }

    /// Whether `version` satisfies this reference's constraint
    pub fn accepts(&self, version: &semver::Version) -> bool {
        self.constraint
            .as_ref()
            .map_or(true, |req| req.matches(version))
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.repository, self.name)?;
        if let Some(req) = &self.constraint {
            write!(f, " {req}")?;
        }
        Ok(())
    }
}

fn split_constraint(input: &str) -> (&str, Option<&str>) {
    if let Some((path, rest)) = input.split_once(char::is_whitespace) {
        let rest = rest.trim();
        return (path, (!rest.is_empty()).then_some(rest));
    }
    match input.find(CONSTRAINT_START) {
        Some(idx) => (&input[..idx], Some(&input[idx..])),
        None => (input, None),
    }
}

fn validate_segment(input: &str, segment: &str, what: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(PackageError::invalid_reference(
            input,
            format!("empty {what} segment"),
        ));
    }
    if segment == "." || segment == ".." {
        return Err(PackageError::invalid_reference(
            input,
            format!("relative {what} segment '{segment}'"),
        ));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(PackageError::invalid_reference(
            input,
            format!("invalid character '{c}' in {what} segment"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_inherits_origin_repository() {
        let dep = DependencyRef::parse("core", "sys/log").unwrap();
        assert_eq!(dep.repository, "core");
        assert_eq!(dep.name, "sys/log");
        assert!(dep.constraint.is_none());
    }

    #[test]
    fn test_parse_qualified_repository() {
        let dep = DependencyRef::parse("apps", "@core/hw/bsp/native").unwrap();
        assert_eq!(dep.id(), PackageId::new("core", "hw/bsp/native"));
    }

    #[rstest]
    #[case("sys/log>=1.2", ">=1.2")]
    #[case("sys/log ^1.0", "^1.0")]
    #[case("@core/sys/log~1.4.0", "~1.4.0")]
    fn test_parse_constraint(#[case] input: &str, #[case] expected: &str) {
        let dep = DependencyRef::parse("core", input).unwrap();
        assert_eq!(dep.name, "sys/log");
        assert_eq!(dep.constraint, Some(VersionReq::parse(expected).unwrap()));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("///bad")]
    #[case("sys//log")]
    #[case("@core")]
    #[case("@/sys/log")]
    #[case("sys/../log")]
    #[case("sys/lo$g")]
    #[case("sys/log>=banana")]
    fn test_parse_malformed(#[case] input: &str) {
        let err = DependencyRef::parse("core", input).unwrap_err();
        assert!(matches!(err, PackageError::InvalidReference { .. }), "{err}");
    }

    #[test]
    fn test_same_id_ignores_constraint() {
        let a = DependencyRef::parse("core", "sys/log").unwrap();
        let b = DependencyRef::parse("core", "@core/sys/log>=2.0").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_accepts_version() {
        let dep = DependencyRef::parse("core", "sys/log>=1.2").unwrap();
        assert!(dep.accepts(&semver::Version::new(1, 3, 0)));
        assert!(!dep.accepts(&semver::Version::new(1, 1, 0)));

        let any = DependencyRef::parse("core", "sys/log").unwrap();
        assert!(any.accepts(&semver::Version::new(0, 0, 1)));
    }

    #[test]
    fn test_display() {
        let dep = DependencyRef::parse("core", "sys/log").unwrap();
        assert_eq!(dep.to_string(), "@core/sys/log");
    }
}
