//! Trellis package model
//!
//! Read-only package manifests and the pieces the resolution engine reads
//! them through:
//! - Identities (build feature/target flags)
//! - Dependency references (`@repo/path/name` with optional version constraint)
//! - Conditional configuration (base values plus identity-keyed fragments)
//! - Dependency resolvers, including the in-memory [`PackageIndex`]

pub mod conditional;
pub mod dependency;
pub mod identity;
pub mod manifest;
pub mod resolver;

pub use conditional::{resolve, ConditionalValue};
pub use dependency::{DependencyRef, PackageId};
pub use identity::{Identity, IdentitySet};
pub use manifest::{keys, Package, PackageMetadata};
pub use resolver::{DependencyResolver, PackageIndex, ResolveError};
pub use semver;

/// Package model errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid dependency reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("Invalid field value: {field} - {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Failed to read manifest at {path}: {error}")]
    ManifestRead {
        path: std::path::PathBuf,
        error: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Semver error: {0}")]
    SemverError(#[from] semver::Error),
}

impl PackageError {
    /// Create an invalid reference error
    pub fn invalid_reference(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;
