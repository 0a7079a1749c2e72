//! Dependency resolution: mapping references to concrete packages

use crate::dependency::{DependencyRef, PackageId};
use crate::manifest::Package;
use crate::Result;
use semver::Version;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Manifest file name looked up by [`PackageIndex::load_dir`]
pub const MANIFEST_FILE: &str = "pkg.toml";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Ambiguous package reference {reference}: candidates {candidates:?}")]
    Ambiguous {
        reference: String,
        candidates: Vec<String>,
    },

    #[error("Resolver failure: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Maps a dependency reference to the package it names.
///
/// Implementations may be slow (repository lookups, downloads); callers treat
/// every call as a synchronous black box.
pub trait DependencyResolver {
    fn resolve(&self, dep: &DependencyRef) -> ResolveResult<Arc<Package>>;
}

impl<R: DependencyResolver + ?Sized> DependencyResolver for &R {
    fn resolve(&self, dep: &DependencyRef) -> ResolveResult<Arc<Package>> {
        (**self).resolve(dep)
    }
}

/// In-memory resolver over a set of known manifests.
///
/// Several versions of the same package may be registered. A reference with a
/// constraint picks the highest satisfying version; a reference without one
/// is ambiguous when more than one version is known.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: HashMap<PackageId, Vec<Arc<Package>>>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package; versions are kept sorted ascending
    pub fn insert(&mut self, package: Package) -> Arc<Package> {
        let package = Arc::new(package);
        let versions = self.packages.entry(package.id()).or_default();
        versions.push(Arc::clone(&package));
        versions.sort_by(|a, b| a.version().cmp(&b.version()));
        package
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with(mut self, package: Package) -> Self {
        self.insert(package);
        self
    }

    /// Load every `pkg.toml` below `root`
    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut index = Self::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
                let package = Package::from_file(entry.path())?;
                debug!(package = %package.id(), path = %entry.path().display(), "indexed manifest");
                index.insert(package);
            }
        }
        Ok(index)
    }

    /// Known versions of `id`, ascending
    pub fn versions(&self, id: &PackageId) -> Vec<Option<&Version>> {
        self.packages
            .get(id)
            .map(|pkgs| pkgs.iter().map(|p| p.version()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl DependencyResolver for PackageIndex {
    fn resolve(&self, dep: &DependencyRef) -> ResolveResult<Arc<Package>> {
        let candidates = self
            .packages
            .get(&dep.id())
            .ok_or_else(|| ResolveError::NotFound(dep.to_string()))?;

        if dep.constraint.is_none() && candidates.len() > 1 {
            return Err(ResolveError::Ambiguous {
                reference: dep.to_string(),
                candidates: candidates
                    .iter()
                    .map(|p| match p.version() {
                        Some(v) => format!("{}@{v}", p.id()),
                        None => p.id().to_string(),
                    })
                    .collect(),
            });
        }

        // Unversioned packages only satisfy unconstrained references.
        candidates
            .iter()
            .rev()
            .find(|p| match (p.version(), &dep.constraint) {
                (_, None) => true,
                (Some(v), Some(_)) => dep.accepts(v),
                (None, Some(_)) => false,
            })
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(dep.to_string()))
    }
}
