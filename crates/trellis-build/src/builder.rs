//! Fixpoint resolution driver
use crate::build_package::{BuildPackage, LoadStatus};
use crate::config::{BuildConfig, BuildSeed};
use crate::error::{BuildError, BuildResult};
use crate::graph::ResolvedGraph;
use crate::state::BuildState;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};
use trellis_package::{
    DependencyRef, DependencyResolver, Identity, IdentitySet, Package, PackageId,
};

/// Resolution statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Passes run; the last one is the clean pass that finalizes packages
    pub passes: usize,
    /// Packages known to the build
    pub packages: usize,
    /// Active identities
    pub identities: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Pending,
    Converged,
    Failed,
}

/// Global fixpoint driver.
///
/// Owns the active identities and every package reachable from the seeded
/// targets, and loads packages pass after pass until a pass discovers
/// nothing.
pub struct Builder<R> {
    resolver: R,
    config: BuildConfig,
    state: BuildState,
    packages: Vec<BuildPackage>,
    index: HashMap<PackageId, usize>,
    stats: ResolveStats,
    status: Status,
}

impl<R: DependencyResolver> Builder<R> {
    /// Create a builder with no targets or identities
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            config: BuildConfig::default(),
            state: BuildState::new(),
            packages: Vec::new(),
            index: HashMap::new(),
            stats: ResolveStats::default(),
            status: Status::Pending,
        }
    }

    /// Create a builder seeded with the identities and targets of `seed`
    pub fn from_seed(resolver: R, seed: &BuildSeed) -> BuildResult<Self> {
        let mut builder = Self::new(resolver).with_config(seed.config());
        for identity in &seed.identities {
            builder.add_identity(identity.as_str());
        }
        for target in &seed.targets {
            let dep = DependencyRef::parse(seed.repository.as_deref().unwrap_or_default(), target)
                .map_err(|e| BuildError::InvalidConfig(format!("target '{target}': {e}")))?;
            builder.add_target(&dep)?;
        }
        Ok(builder)
    }

    /// Set build configuration
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Limit the number of passes
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.config.max_passes = Some(max_passes);
        self
    }

    /// Activate a starting identity; returns `false` if already active
    pub fn add_identity(&mut self, identity: impl Into<Identity>) -> bool {
        self.state.add_identity(identity.into())
    }

    /// Seed a target package directly
    pub fn add_package(&mut self, package: Package) -> bool {
        let added = self.state.add_package(Arc::new(package));
        self.sync_packages();
        added
    }

    /// Resolve a target reference and seed the package it names
    pub fn add_target(&mut self, target: &DependencyRef) -> BuildResult<bool> {
        let package =
            self.resolver
                .resolve(target)
                .map_err(|source| BuildError::UnresolvedTarget {
                    target: target.to_string(),
                    source,
                })?;
        let added = self.state.add_package(package);
        self.sync_packages();
        Ok(added)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn identities(&self) -> &IdentitySet {
        self.state.identities()
    }

    /// Known packages in discovery order
    pub fn packages(&self) -> &[BuildPackage] {
        &self.packages
    }

    pub fn package(&self, id: &PackageId) -> Option<&BuildPackage> {
        self.index.get(id).map(|&idx| &self.packages[idx])
    }

    pub fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    pub fn is_converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// Load every package until the identity and package sets stop growing.
    ///
    /// Each pass runs discovery over every unloaded package. A pass that
    /// discovers nothing has seen the final identity set, and goes on to
    /// resolve every package's APIs and compiler settings against it. The
    /// first error aborts the run and leaves the builder unusable.
    pub fn run_to_fixpoint(&mut self) -> BuildResult<ResolveStats> {
        match self.status {
            Status::Converged => return Ok(self.stats.clone()),
            Status::Failed => {
                return Err(BuildError::NotResolved(
                    "a previous resolution attempt failed".to_string(),
                ))
            }
            Status::Pending => {}
        }

        match self.drive() {
            Ok(()) => {
                self.status = Status::Converged;
                info!(
                    passes = self.stats.passes,
                    packages = self.stats.packages,
                    identities = self.stats.identities,
                    "resolution converged"
                );
                Ok(self.stats.clone())
            }
            Err(e) => {
                self.status = Status::Failed;
                Err(e)
            }
        }
    }

    fn drive(&mut self) -> BuildResult<()> {
        // Nothing to load: the seeded sets are already the fixpoint.
        if self.packages.is_empty() {
            self.stats.identities = self.state.identities().len();
            return Ok(());
        }

        loop {
            if let Some(max) = self.config.max_passes {
                if self.stats.passes >= max {
                    return Err(BuildError::NotConverged { passes: max });
                }
            }
            self.stats.passes += 1;

            let mut discovered = self.run_pass(false)?;
            // A clean discovery pass fixes the identity set, so every package
            // can be finalized against it within the same pass.
            if !discovered {
                discovered = self.run_pass(true)?;
            }
            self.stats.packages = self.state.package_count();
            self.stats.identities = self.state.identities().len();

            if self.config.verbose {
                info!(
                    pass = self.stats.passes,
                    discovered,
                    packages = self.stats.packages,
                    identities = self.stats.identities,
                    "pass complete"
                );
            } else {
                debug!(
                    pass = self.stats.passes,
                    discovered,
                    packages = self.stats.packages,
                    identities = self.stats.identities,
                    "pass complete"
                );
            }

            if !discovered {
                return Ok(());
            }
        }
    }

    /// One pass over a worklist of unloaded packages. Packages registered
    /// during the pass are appended to the worklist.
    ///
    /// With `finalize` set every package runs its full `load`; a package
    /// left `Pending` counts as a discovery.
    fn run_pass(&mut self, finalize: bool) -> BuildResult<bool> {
        let mut worklist: VecDeque<usize> = (0..self.packages.len())
            .filter(|&idx| !self.packages[idx].is_loaded())
            .collect();
        let mut discovered = false;

        while let Some(idx) = worklist.pop_front() {
            let known = self.packages.len();
            let bpkg = &mut self.packages[idx];

            let found = if finalize {
                bpkg.load(&mut self.state, &self.resolver)? == LoadStatus::Pending
            } else {
                bpkg.discover(&mut self.state, &self.resolver)?
            };
            discovered |= found;

            self.sync_packages();
            worklist.extend(known..self.packages.len());
        }

        Ok(discovered)
    }

    /// Wrap every newly registered package in a `BuildPackage`
    fn sync_packages(&mut self) {
        let start = self.packages.len();
        for package in &self.state.packages()[start..] {
            self.index.insert(package.id(), self.packages.len());
            self.packages.push(BuildPackage::new(Arc::clone(package)));
        }
    }

    /// Consume a converged builder into the resolved build graph
    pub fn into_graph(self) -> BuildResult<ResolvedGraph> {
        if self.status != Status::Converged {
            return Err(BuildError::NotResolved(
                "run_to_fixpoint has not completed successfully".to_string(),
            ));
        }
        let graph = ResolvedGraph::new(self.state.identities().clone(), &self.packages);
        if self.config.strict_apis {
            graph.check_apis()?;
        }
        Ok(graph)
    }
}
