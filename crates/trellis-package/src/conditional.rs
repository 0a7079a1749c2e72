//! Identity-conditioned configuration values

use crate::identity::{Identity, IdentitySet};
use crate::manifest::Package;
use serde::Serialize;
use tracing::trace;

/// One manifest key: a base list plus identity-conditioned fragments.
///
/// Fragments are kept in declaration order so that merging is independent of
/// how the active identity set happens to be ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionalValue {
    pub base: Vec<String>,
    pub fragments: Vec<(Identity, Vec<String>)>,
}

impl ConditionalValue {
    pub fn new(base: Vec<String>) -> Self {
        Self {
            base,
            fragments: Vec::new(),
        }
    }

    /// Append values to the fragment for `identity`, creating it on first use
    pub fn push_fragment(&mut self, identity: Identity, values: Vec<String>) {
        match self.fragments.iter_mut().find(|(id, _)| *id == identity) {
            Some((_, existing)) => existing.extend(values),
            None => self.fragments.push((identity, values)),
        }
    }

    /// Base values followed by every fragment whose identity is active.
    ///
    /// Duplicates are kept.
    pub fn resolve(&self, active: &IdentitySet) -> Vec<String> {
        let mut values = self.base.clone();
        for (identity, fragment) in &self.fragments {
            if active.contains(identity) {
                values.extend(fragment.iter().cloned());
            }
        }
        values
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.fragments.iter().all(|(_, v)| v.is_empty())
    }
}

/// Merged values of `key` in `package` under the `active` identities.
///
/// A key the manifest never mentions resolves to an empty list.
pub fn resolve(package: &Package, key: &str, active: &IdentitySet) -> Vec<String> {
    let values = package
        .values(key)
        .map(|value| value.resolve(active))
        .unwrap_or_default();
    trace!(package = %package.id(), key, count = values.len(), "resolved key");
    values
}
