//! Per-package resolution state
use crate::error::{BuildError, BuildResult};
use crate::state::BuildState;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, trace};
use trellis_package::{
    keys, resolve, DependencyRef, DependencyResolver, Identity, IdentitySet, Package, PackageId,
};

/// Compiler settings of a loaded package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilerInfo {
    pub includes: Vec<String>,
    pub cflags: Vec<String>,
    pub lflags: Vec<String>,
    pub aflags: Vec<String>,
}

impl CompilerInfo {
    fn resolve(package: &Package, active: &IdentitySet) -> Self {
        Self {
            includes: resolve(package, keys::INCLUDES, active),
            cflags: resolve(package, keys::CFLAGS, active),
            lflags: resolve(package, keys::LFLAGS, active),
            aflags: resolve(package, keys::AFLAGS, active),
        }
    }
}

/// Outcome of one [`BuildPackage::load`] pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// New identities or dependencies were found; revisit in a later pass
    Pending,
    /// Terminal settings are resolved
    Loaded,
}

impl LoadStatus {
    pub fn is_loaded(self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// One package's resolution state within a build
#[derive(Debug, Clone)]
pub struct BuildPackage {
    package: Arc<Package>,
    compiler_info: Option<CompilerInfo>,
    dependencies: BTreeMap<PackageId, DependencyRef>,
    resolved_deps: BTreeSet<PackageId>,
    apis: BTreeMap<PackageId, DependencyRef>,
    req_apis: BTreeMap<PackageId, DependencyRef>,
    loaded: bool,
}

impl BuildPackage {
    pub fn new(package: Arc<Package>) -> Self {
        Self {
            package,
            compiler_info: None,
            dependencies: BTreeMap::new(),
            resolved_deps: BTreeSet::new(),
            apis: BTreeMap::new(),
            req_apis: BTreeMap::new(),
            loaded: false,
        }
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn id(&self) -> PackageId {
        self.package.id()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Resolved compiler settings; `None` until loaded
    pub fn compiler_info(&self) -> Option<&CompilerInfo> {
        self.compiler_info.as_ref()
    }

    /// Declared dependencies keyed by referenced package id
    pub fn dependencies(&self) -> &BTreeMap<PackageId, DependencyRef> {
        &self.dependencies
    }

    /// Ids of the packages the dependencies resolved to
    pub fn resolved_dependencies(&self) -> &BTreeSet<PackageId> {
        &self.resolved_deps
    }

    pub fn has_dep(&self, dep: &DependencyRef) -> bool {
        self.dependencies.contains_key(&dep.id())
    }

    pub fn apis(&self) -> &BTreeMap<PackageId, DependencyRef> {
        &self.apis
    }

    pub fn req_apis(&self) -> &BTreeMap<PackageId, DependencyRef> {
        &self.req_apis
    }

    /// Activate every identity this package declares under `active`.
    ///
    /// Returns whether any identity was new to the build.
    pub fn load_identities(&self, state: &mut BuildState, active: &IdentitySet) -> bool {
        let mut found_new = false;
        for ident in resolve(&self.package, keys::IDENTITIES, active) {
            if !active.contains(ident.as_str()) && state.add_identity(Identity::new(ident.as_str()))
            {
                debug!(package = %self.id(), identity = %ident, "activated identity");
                found_new = true;
            }
        }
        found_new
    }

    /// Resolve and register every dependency this package declares under
    /// `active`.
    ///
    /// Returns whether any resolved package was new to the build. A malformed
    /// reference fails before the resolver is consulted for it.
    pub fn load_deps(
        &mut self,
        state: &mut BuildState,
        resolver: &dyn DependencyResolver,
        active: &IdentitySet,
    ) -> BuildResult<bool> {
        let mut found_new = false;

        for raw in resolve(&self.package, keys::DEPS, active) {
            let dep = DependencyRef::parse(self.package.repository(), &raw)
                .map_err(|e| BuildError::parse(self.id(), e))?;

            let resolved = resolver
                .resolve(&dep)
                .map_err(|e| BuildError::unresolved(self.id(), &dep, e))?;
            let resolved_id = resolved.id();

            if state.add_package(resolved) {
                debug!(package = %self.id(), dependency = %resolved_id, "discovered package");
                found_new = true;
            }

            // First reference to a package id wins.
            if !self.has_dep(&dep) {
                trace!(package = %self.id(), dependency = %dep, "recorded dependency");
                self.dependencies.insert(dep.id(), dep);
                self.resolved_deps.insert(resolved_id);
            }
        }

        Ok(found_new)
    }

    /// Run one discovery step against the current global view.
    ///
    /// Returns whether any identity or package was new.
    pub fn discover(
        &mut self,
        state: &mut BuildState,
        resolver: &dyn DependencyResolver,
    ) -> BuildResult<bool> {
        if self.loaded {
            return Ok(false);
        }
        let (_, found_new) = self.step(state, resolver)?;
        Ok(found_new)
    }

    /// Load this package for one pass.
    ///
    /// Returns `Pending` when the pass discovered new identities or packages;
    /// otherwise resolves APIs and compiler settings and returns `Loaded`.
    /// Calling it again after `Loaded` does nothing.
    pub fn load(
        &mut self,
        state: &mut BuildState,
        resolver: &dyn DependencyResolver,
    ) -> BuildResult<LoadStatus> {
        if self.loaded {
            return Ok(LoadStatus::Loaded);
        }

        let (active, found_new) = self.step(state, resolver)?;
        if found_new {
            return Ok(LoadStatus::Pending);
        }

        self.finalize(&active)?;
        Ok(LoadStatus::Loaded)
    }

    /// Snapshot the active identities, then load identities and dependencies
    /// against that snapshot.
    fn step(
        &mut self,
        state: &mut BuildState,
        resolver: &dyn DependencyResolver,
    ) -> BuildResult<(IdentitySet, bool)> {
        // Identities and dependencies both see the view from the start of the pass.
        let active = state.identities().clone();
        let new_idents = self.load_identities(state, &active);
        let new_deps = self.load_deps(state, resolver, &active)?;
        Ok((active, new_idents || new_deps))
    }

    fn finalize(&mut self, active: &IdentitySet) -> BuildResult<()> {
        let apis = self.parse_apis(keys::APIS, active)?;
        let req_apis = self.parse_apis(keys::REQ_APIS, active)?;
        let compiler_info = CompilerInfo::resolve(&self.package, active);

        self.apis.extend(apis);
        self.req_apis.extend(req_apis);
        self.compiler_info = Some(compiler_info);
        self.loaded = true;

        debug!(
            package = %self.id(),
            deps = self.dependencies.len(),
            apis = self.apis.len(),
            req_apis = self.req_apis.len(),
            "package loaded"
        );
        Ok(())
    }

    fn parse_apis(
        &self,
        key: &str,
        active: &IdentitySet,
    ) -> BuildResult<BTreeMap<PackageId, DependencyRef>> {
        let mut apis = BTreeMap::new();
        for raw in resolve(&self.package, key, active) {
            let api = DependencyRef::parse(self.package.repository(), &raw)
                .map_err(|e| BuildError::parse(self.id(), e))?;
            apis.entry(api.id()).or_insert(api);
        }
        Ok(apis)
    }
}
