//! Build identities

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// A build feature/target flag, e.g. `BSP_NATIVE` or `DEBUG`.
///
/// Identities carry no structure; two identities are equal when their
/// strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Identity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for Identity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Ordered set of active identities
pub type IdentitySet = BTreeSet<Identity>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_set_lookup_by_str() {
        let mut set = IdentitySet::new();
        set.insert(Identity::from("DEBUG"));
        assert!(set.contains("DEBUG"));
        assert!(!set.contains("RELEASE"));
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(Identity::new("BSP_NATIVE").to_string(), "BSP_NATIVE");
    }
}
