//! Trellis build resolution
//!
//! Co-resolves a package graph to a fixed point:
//! - Per-package loading of identity-conditioned manifest values
//! - Global identity propagation
//! - Transitive dependency discovery through a [`DependencyResolver`]
//! - Convergence detection and the resolved graph consumed by later stages
//!
//! # Example
//!
//! ```
//! use trellis_build::Builder;
//! use trellis_package::{keys, Package, PackageIndex};
//!
//! let index = PackageIndex::new().with(Package::new("core", "sys/log"));
//! let app = Package::new("apps", "blinky")
//!     .with_values(keys::DEPS, &["@core/sys/log"])
//!     .with_values(keys::CFLAGS, &["-O2"]);
//!
//! let mut builder = Builder::new(index);
//! builder.add_package(app);
//! builder.run_to_fixpoint().unwrap();
//!
//! let graph = builder.into_graph().unwrap();
//! assert_eq!(graph.len(), 2);
//! ```

pub mod build_package;
pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod state;

// Re-export main types
pub use build_package::{BuildPackage, CompilerInfo, LoadStatus};
pub use builder::{Builder, ResolveStats};
pub use config::{BuildConfig, BuildSeed};
pub use error::{BuildError, BuildResult};
pub use graph::{ResolvedGraph, ResolvedPackage};
pub use state::BuildState;

// Re-export trellis-package types for convenience
pub use trellis_package::{DependencyRef, DependencyResolver, Identity, Package, PackageId};
