//! Shared, append-only resolution state
use std::collections::HashMap;
use std::sync::Arc;
use trellis_package::{Identity, IdentitySet, Package, PackageId};

/// Active identities and every package known to the build.
///
/// Owned by the [`Builder`](crate::Builder) and lent to each package load.
/// Both collections only grow.
#[derive(Debug, Default)]
pub struct BuildState {
    identities: IdentitySet,
    packages: Vec<Arc<Package>>,
    index: HashMap<PackageId, usize>,
}

impl BuildState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identities(&self) -> &IdentitySet {
        &self.identities
    }

    pub fn has_identity(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }

    /// Activate an identity; returns `false` if it was already active
    pub fn add_identity(&mut self, identity: Identity) -> bool {
        self.identities.insert(identity)
    }

    pub fn has_package(&self, id: &PackageId) -> bool {
        self.index.contains_key(id)
    }

    /// Register a package; returns `false` if its id was already known
    pub fn add_package(&mut self, package: Arc<Package>) -> bool {
        let id = package.id();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.packages.len());
        self.packages.push(package);
        true
    }

    /// Registered packages in registration order
    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_package::semver::Version;

    #[test]
    fn test_add_identity_once() {
        let mut state = BuildState::new();
        assert!(state.add_identity(Identity::from("DEBUG")));
        assert!(!state.add_identity(Identity::from("DEBUG")));
        assert!(state.has_identity("DEBUG"));
        assert_eq!(state.identities().len(), 1);
    }

    #[test]
    fn test_add_package_keyed_by_id() {
        let mut state = BuildState::new();
        assert!(state.add_package(Arc::new(Package::new("core", "sys/log"))));
        let newer = Package::new("core", "sys/log").with_version(Version::new(2, 0, 0));
        assert!(!state.add_package(Arc::new(newer)));
        assert_eq!(state.package_count(), 1);
        assert!(state.has_package(&PackageId::new("core", "sys/log")));
    }
}
