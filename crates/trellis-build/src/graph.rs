//! Resolved build graph handed to downstream build stages
use crate::build_package::{BuildPackage, CompilerInfo};
use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use trellis_package::semver::Version;
use trellis_package::{DependencyRef, IdentitySet, PackageId};

/// Final state of one package after convergence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPackage {
    pub id: PackageId,
    pub version: Option<Version>,
    /// Declared dependencies, one per referenced package id
    pub dependencies: Vec<DependencyRef>,
    /// Packages those dependencies resolved to
    pub resolved_dependencies: Vec<PackageId>,
    pub apis: Vec<DependencyRef>,
    pub req_apis: Vec<DependencyRef>,
    pub compiler_info: CompilerInfo,
}

impl ResolvedPackage {
    fn from_build_package(bpkg: &BuildPackage) -> Self {
        Self {
            id: bpkg.id(),
            version: bpkg.package().version().cloned(),
            dependencies: bpkg.dependencies().values().cloned().collect(),
            resolved_dependencies: bpkg.resolved_dependencies().iter().cloned().collect(),
            apis: bpkg.apis().values().cloned().collect(),
            req_apis: bpkg.req_apis().values().cloned().collect(),
            compiler_info: bpkg.compiler_info().cloned().unwrap_or_default(),
        }
    }

    pub fn provides(&self, api: &str) -> bool {
        self.apis.iter().any(|a| a.name == api)
    }
}

/// Every package of a converged build, sorted by id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedGraph {
    pub identities: IdentitySet,
    pub packages: Vec<ResolvedPackage>,
}

impl ResolvedGraph {
    pub(crate) fn new(identities: IdentitySet, packages: &[BuildPackage]) -> Self {
        let mut packages: Vec<ResolvedPackage> = packages
            .iter()
            .map(ResolvedPackage::from_build_package)
            .collect();
        packages.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            identities,
            packages,
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.find(id).is_some()
    }

    fn find(&self, id: &PackageId) -> Option<&ResolvedPackage> {
        self.packages
            .binary_search_by(|p| p.id.cmp(id))
            .ok()
            .map(|idx| &self.packages[idx])
    }

    pub fn package(&self, id: &PackageId) -> BuildResult<&ResolvedPackage> {
        self.find(id)
            .ok_or_else(|| BuildError::UnknownPackage(id.clone()))
    }

    /// Packages providing the API named `api`.
    ///
    /// API names are matched without their repository.
    pub fn api_providers(&self, api: &str) -> Vec<&PackageId> {
        self.packages
            .iter()
            .filter(|p| p.provides(api))
            .map(|p| &p.id)
            .collect()
    }

    /// Required APIs that no package in the graph provides
    pub fn unsatisfied_apis(&self) -> Vec<(&PackageId, &DependencyRef)> {
        let provided: BTreeSet<&str> = self
            .packages
            .iter()
            .flat_map(|p| p.apis.iter().map(|a| a.name.as_str()))
            .collect();

        self.packages
            .iter()
            .flat_map(|p| p.req_apis.iter().map(move |api| (&p.id, api)))
            .filter(|(_, api)| !provided.contains(api.name.as_str()))
            .collect()
    }

    /// Fail on the first required API without a provider
    pub fn check_apis(&self) -> BuildResult<()> {
        match self.unsatisfied_apis().first() {
            Some((package, api)) => Err(BuildError::UnsatisfiedApi {
                package: (*package).clone(),
                api: api.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Topological order, dependencies first (Kahn's algorithm).
    ///
    /// Ties are broken by package id so the order is stable. Dependency cycles
    /// are legal during resolution but cannot be ordered.
    pub fn build_order(&self) -> BuildResult<Vec<PackageId>> {
        let mut remaining: BTreeMap<&PackageId, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&PackageId, Vec<&PackageId>> = BTreeMap::new();

        for package in &self.packages {
            let deps: Vec<&PackageId> = package
                .resolved_dependencies
                .iter()
                .filter(|d| self.contains(d))
                .collect();
            remaining.insert(&package.id, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(&package.id);
            }
        }

        let mut ready: BTreeSet<&PackageId> = remaining
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.packages.len());

        while let Some(id) = ready.pop_first() {
            order.push(id.clone());
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() != self.packages.len() {
            let cycle: Vec<String> = remaining
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(id, _)| id.to_string())
                .collect();
            return Err(BuildError::CircularDependency(cycle.join(", ")));
        }

        Ok(order)
    }

    /// Render the graph as pretty-printed JSON
    pub fn to_json(&self) -> BuildResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
