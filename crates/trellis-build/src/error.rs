/// Build resolution error types
use std::path::PathBuf;
use thiserror::Error;
use trellis_package::{DependencyRef, PackageError, PackageId, ResolveError};

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Malformed reference in package {package}: {source}")]
    Parse {
        package: PackageId,
        #[source]
        source: PackageError,
    },

    #[error("Could not resolve dependency {dependency} of package {package}: {reason}")]
    UnresolvedDependency {
        package: PackageId,
        dependency: String,
        reason: String,
    },

    #[error("Resolver failed on dependency {dependency} of package {package}: {source}")]
    ResolverFailure {
        package: PackageId,
        dependency: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not resolve build target {target}: {source}")]
    UnresolvedTarget {
        target: String,
        #[source]
        source: ResolveError,
    },

    #[error("Resolution did not converge within {passes} passes")]
    NotConverged { passes: usize },

    #[error("Build graph is not resolved: {0}")]
    NotResolved(String),

    #[error("Package not in build: {0}")]
    UnknownPackage(PackageId),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Required API '{api}' of package {package} is not provided by any package")]
    UnsatisfiedApi { package: PackageId, api: String },

    #[error("Invalid build configuration in {path}: {error}")]
    ConfigParse {
        path: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid build configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    #[error("Failed to serialize build graph: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BuildError {
    /// Create a parse error for a reference declared by `package`
    pub fn parse(package: PackageId, source: PackageError) -> Self {
        Self::Parse { package, source }
    }

    /// Classify a resolver error for `dependency` declared by `package`.
    ///
    /// Not-found and ambiguous results become `UnresolvedDependency`; anything
    /// else is kept as the source of a `ResolverFailure`.
    pub fn unresolved(package: PackageId, dependency: &DependencyRef, error: ResolveError) -> Self {
        match error {
            ResolveError::Failed(source) => Self::ResolverFailure {
                package,
                dependency: dependency.to_string(),
                source,
            },
            other => Self::UnresolvedDependency {
                package,
                dependency: dependency.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }
}
