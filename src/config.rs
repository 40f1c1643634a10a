//! Container configuration.
//!
//! Sources are merged in this order, later ones overriding earlier:
//! 1. [`ContainerConfig::default`]
//! 2. An optional TOML file
//! 3. Environment variables prefixed with [`ENV_PREFIX`] (e.g. `SERVICE_COMPOSER_LATE_REGISTRATION=ignore`)

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::catalog::directory::DEFAULT_MANIFEST_PATTERN;
use crate::catalog::DirectoryOptions;
use crate::error::Result;

pub const ENV_PREFIX: &str = "SERVICE_COMPOSER_";

/// What happens when a catalog is added after realization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateRegistration {
    /// Fail with [`CompositionError::LateRegistration`](crate::CompositionError::LateRegistration).
    #[default]
    Reject,
    /// Drop the catalog with a warning. Existing providers are unaffected.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub late_registration: LateRegistration,
    /// Default manifest patterns for directory catalogs.
    pub manifest_patterns: Vec<String>,
    /// Default exclusions for directory catalogs.
    pub manifest_exclude: Vec<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            late_registration: LateRegistration::default(),
            manifest_patterns: vec![DEFAULT_MANIFEST_PATTERN.to_string()],
            manifest_exclude: Vec::new(),
        }
    }
}

impl ContainerConfig {
    /// Defaults overridden by the environment.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load from defaults and the environment.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// Load from defaults, a TOML file and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    pub fn with_late_registration(mut self, policy: LateRegistration) -> Self {
        self.late_registration = policy;
        self
    }

    pub(crate) fn directory_options(&self) -> DirectoryOptions {
        DirectoryOptions::default()
            .with_patterns(self.manifest_patterns.iter().cloned())
            .with_exclude(self.manifest_exclude.iter().cloned())
    }
}
