//! Build configuration and seeding
//!
//! A build seed names the starting identities and target packages:
//!
//! ```toml
//! repository = "apps"
//! identities = ["BSP_NATIVE"]
//! targets = ["blinky", "@core/sys/shell"]
//! max_passes = 64
//! strict_apis = true
//! ```

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resolution settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Upper bound on passes; `None` runs until convergence
    pub max_passes: Option<usize>,
    /// Fail `into_graph` when a required API has no provider
    pub strict_apis: bool,
    /// Report each pass at `info` level instead of `debug`
    pub verbose: bool,
}

impl BuildConfig {
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    pub fn with_strict_apis(mut self, strict: bool) -> Self {
        self.strict_apis = strict;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Starting identities and targets for one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSeed {
    /// Repository for targets written without an `@repo/` prefix
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub identities: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub max_passes: Option<usize>,
    #[serde(default)]
    pub strict_apis: bool,
}

impl BuildSeed {
    /// Parse a seed from TOML
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> BuildResult<Self> {
        let seed: Self = toml::from_str(content).map_err(|error| BuildError::ConfigParse {
            path: "<inline>".into(),
            error,
        })?;
        seed.validate()?;
        Ok(seed)
    }

    /// Load a seed file
    pub fn from_file(path: &Path) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let seed: Self = toml::from_str(&content).map_err(|error| BuildError::ConfigParse {
            path: path.to_path_buf(),
            error,
        })?;
        seed.validate()?;
        Ok(seed)
    }

    fn validate(&self) -> BuildResult<()> {
        if self.targets.is_empty() {
            return Err(BuildError::InvalidConfig(
                "at least one target is required".to_string(),
            ));
        }
        if self.max_passes == Some(0) {
            return Err(BuildError::InvalidConfig(
                "max_passes must be greater than zero".to_string(),
            ));
        }
        if let Some(identity) = self.identities.iter().find(|i| i.trim().is_empty()) {
            return Err(BuildError::InvalidConfig(format!(
                "invalid identity '{identity}'"
            )));
        }
        Ok(())
    }

    /// Resolution settings carried by this seed
    pub fn config(&self) -> BuildConfig {
        BuildConfig {
            max_passes: self.max_passes,
            strict_apis: self.strict_apis,
            verbose: false,
        }
    }
}
