use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::key::ServiceKey;

/// Boxed error returned by catalogs and disposal hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = CompositionError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("no exported instance found for '{key}'")]
    NotFound { key: ServiceKey },

    #[error("more than one exported instance found for '{key}' ({count} matches)")]
    AmbiguousService { key: ServiceKey, count: usize },

    #[error("exported instance for '{key}' is not a '{expected}'")]
    TypeMismatch {
        key: ServiceKey,
        expected: &'static str,
    },

    #[error("invalid catalog input: {0}")]
    InvalidCatalogInput(String),

    #[error("catalog '{catalog}' failed to list classes")]
    Catalog {
        catalog: String,
        #[source]
        source: BoxError,
    },

    #[error("malformed manifest '{}'", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} provider(s) failed to dispose: {}", .0.len(), DisplayFailures(.0))]
    Disposal(Vec<DisposeFailure>),

    #[error("catalog added after the container was realized")]
    LateRegistration,

    #[error("container has been disposed")]
    Disposed,

    #[error(transparent)]
    Config(#[from] figment::Error),
}

impl CompositionError {
    pub(crate) fn catalog(catalog: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Catalog {
            catalog: catalog.into(),
            source: source.into(),
        }
    }
}

/// A provider whose disposal hook returned an error.
#[derive(Debug)]
pub struct DisposeFailure {
    pub class: &'static str,
    pub key: ServiceKey,
    pub source: BoxError,
}

impl fmt::Display for DisposeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.class, self.key, self.source)
    }
}

struct DisplayFailures<'a>(&'a [DisposeFailure]);

impl fmt::Display for DisplayFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
