//! Package manifest view (pkg.toml)
//!
//! ```toml
//! [package]
//! name = "sys/log"
//! repository = "core"
//! version = "1.2.0"
//!
//! [pkg]
//! deps = ["sys/stats"]
//! cflags = ["-DLOG_LEVEL=1"]
//!
//! [identity.DEBUG]
//! cflags = ["-g"]
//! ```

use crate::conditional::ConditionalValue;
use crate::dependency::PackageId;
use crate::identity::Identity;
use crate::{PackageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Manifest keys read by the resolution engine
pub mod keys {
    pub const DEPS: &str = "deps";
    pub const IDENTITIES: &str = "identities";
    pub const APIS: &str = "apis";
    pub const REQ_APIS: &str = "req_apis";
    pub const INCLUDES: &str = "includes";
    pub const CFLAGS: &str = "cflags";
    pub const LFLAGS: &str = "lflags";
    pub const AFLAGS: &str = "aflags";
}

/// Package metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageMetadata {
    pub name: String,
    pub repository: String,
    #[serde(default)]
    pub version: Option<semver::Version>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Read-only declarative view of one package.
///
/// The resolution engine never mutates a `Package`; it is shared between the
/// resolver and build state behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub metadata: PackageMetadata,
    values: BTreeMap<String, ConditionalValue>,
}

#[derive(Deserialize)]
struct RawManifest {
    package: PackageMetadata,
    #[serde(default)]
    pkg: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    identity: toml::Table,
}

impl Package {
    /// Create an empty manifest for `@repository/name`
    pub fn new(repository: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: PackageMetadata {
                name: name.into(),
                repository: repository.into(),
                version: None,
                description: None,
            },
            values: BTreeMap::new(),
        }
    }

    /// Set the package version
    pub fn with_version(mut self, version: semver::Version) -> Self {
        self.metadata.version = Some(version);
        self
    }

    /// Append base values for `key`
    pub fn with_values(mut self, key: &str, values: &[&str]) -> Self {
        self.values
            .entry(key.to_string())
            .or_default()
            .base
            .extend(values.iter().map(|v| v.to_string()));
        self
    }

    /// Append values for `key` that apply only while `identity` is active
    pub fn with_fragment(mut self, identity: &str, key: &str, values: &[&str]) -> Self {
        self.values.entry(key.to_string()).or_default().push_fragment(
            Identity::from(identity),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Parse manifest from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)?;

        let mut values: BTreeMap<String, ConditionalValue> = raw
            .pkg
            .into_iter()
            .map(|(key, base)| (key, ConditionalValue::new(base)))
            .collect();

        for (identity, table) in raw.identity {
            let fragment: BTreeMap<String, Vec<String>> = table.try_into().map_err(|e| {
                PackageError::invalid_field(format!("identity.{identity}"), e.to_string())
            })?;
            for (key, list) in fragment {
                values
                    .entry(key)
                    .or_default()
                    .push_fragment(Identity::new(identity.as_str()), list);
            }
        }

        let package = Self {
            metadata: raw.package,
            values,
        };
        package.validate()?;
        Ok(package)
    }

    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| PackageError::ManifestRead {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.metadata.name.trim().is_empty() {
            return Err(PackageError::invalid_field("package.name", "must not be empty"));
        }
        if self.metadata.repository.trim().is_empty() {
            return Err(PackageError::invalid_field(
                "package.repository",
                "must not be empty",
            ));
        }
        Ok(())
    }

    pub fn id(&self) -> PackageId {
        PackageId::new(&self.metadata.repository, &self.metadata.name)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn repository(&self) -> &str {
        &self.metadata.repository
    }

    pub fn version(&self) -> Option<&semver::Version> {
        self.metadata.version.as_ref()
    }

    /// Raw conditional value stored under `key`
    pub fn values(&self, key: &str) -> Option<&ConditionalValue> {
        self.values.get(key)
    }

    /// Keys declared by this manifest, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
