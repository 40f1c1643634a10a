//! Manifest-backed catalogs.
//!
//! A manifest is a TOML file naming classes from a [`ClassRegistry`]:
//!
//! ```toml
//! classes = ["SqlStore", "AuditLog"]
//! ```
//!
//! The async listings read through `tokio::fs`. Polled outside a Tokio
//! runtime they scan synchronously instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::debug;
use walkdir::WalkDir;

use super::{Catalog, ClassRegistry};
use crate::descriptor::ClassDescriptor;
use crate::error::{CompositionError, Result};

pub const DEFAULT_MANIFEST_PATTERN: &str = "*.toml";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    classes: Vec<String>,
}

/// Options for [`DirectoryCatalog`] and [`FileCatalog`].
#[derive(Debug, Clone, Default)]
pub struct DirectoryOptions {
    /// Base directory for relative paths. Defaults to the process working directory.
    pub cwd: Option<PathBuf>,
    /// Manifest file patterns, matched against paths relative to the scanned
    /// directory. Empty means [`DEFAULT_MANIFEST_PATTERN`].
    pub patterns: Vec<String>,
    /// Patterns of files to skip.
    pub exclude: Vec<String>,
}

impl DirectoryOptions {
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let cwd = match &self.cwd {
            Some(cwd) if cwd.is_absolute() => cwd.clone(),
            Some(cwd) => current_dir()?.join(cwd),
            None => current_dir()?,
        };
        Ok(cwd.join(path))
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| CompositionError::catalog("cwd", e))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        let glob = Glob::new(pattern).map_err(|e| {
            CompositionError::InvalidCatalogInput(format!("invalid pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| CompositionError::InvalidCatalogInput(e.to_string()))
}

fn parse_manifest(path: &Path, text: &str, registry: &ClassRegistry) -> Result<Vec<ClassDescriptor>> {
    let manifest: Manifest = toml::from_str(text).map_err(|source| CompositionError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    manifest
        .classes
        .iter()
        .map(|name| registry.resolve(name))
        .collect()
}

/// Catalog over every manifest file found below a directory.
///
/// Files are visited in file-name order, so both listing modes see the
/// same sequence.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    directory: PathBuf,
    registry: Arc<ClassRegistry>,
    patterns: GlobSet,
    exclude: GlobSet,
}

impl DirectoryCatalog {
    pub fn new(directory: impl AsRef<Path>, registry: Arc<ClassRegistry>) -> Result<Self> {
        Self::with_options(directory, registry, DirectoryOptions::default())
    }

    pub fn with_options(
        directory: impl AsRef<Path>,
        registry: Arc<ClassRegistry>,
        options: DirectoryOptions,
    ) -> Result<Self> {
        let directory = options.absolute(directory.as_ref())?;
        if directory.exists() && !directory.is_dir() {
            return Err(CompositionError::InvalidCatalogInput(format!(
                "'{}' is not a directory",
                directory.display()
            )));
        }

        let patterns = if options.patterns.iter().all(|p| p.trim().is_empty()) {
            vec![DEFAULT_MANIFEST_PATTERN.to_string()]
        } else {
            options.patterns
        };

        Ok(Self {
            directory,
            registry,
            patterns: build_globset(&patterns)?,
            exclude: build_globset(&options.exclude)?,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn manifest_files(&self) -> Result<Vec<PathBuf>> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.directory).sort_by_file_name() {
            let entry = entry.map_err(|e| CompositionError::catalog(self.describe(), e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.directory)
                .unwrap_or(entry.path());
            if self.patterns.is_match(relative) && !self.exclude.is_match(relative) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

impl Catalog for DirectoryCatalog {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        let mut classes = Vec::new();
        for path in self.manifest_files()? {
            debug!(manifest = %path.display(), "reading manifest");
            let text = std::fs::read_to_string(&path)
                .map_err(|e| CompositionError::catalog(self.describe(), e))?;
            classes.extend(parse_manifest(&path, &text, &self.registry)?);
        }
        Ok(classes)
    }

    fn list_classes(&self) -> BoxFuture<'_, Result<Vec<ClassDescriptor>>> {
        Box::pin(async move {
            if Handle::try_current().is_err() {
                return self.list_classes_sync();
            }
            let scan = self.clone();
            let files = tokio::task::spawn_blocking(move || scan.manifest_files())
                .await
                .map_err(|e| CompositionError::catalog(self.describe(), e))??;

            let mut classes = Vec::new();
            for path in files {
                debug!(manifest = %path.display(), "reading manifest");
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| CompositionError::catalog(self.describe(), e))?;
                classes.extend(parse_manifest(&path, &text, &self.registry)?);
            }
            Ok(classes)
        })
    }

    fn describe(&self) -> String {
        format!("directory:{}", self.directory.display())
    }
}

/// Catalog over a single manifest file.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    file: PathBuf,
    registry: Arc<ClassRegistry>,
}

impl FileCatalog {
    pub fn new(file: impl AsRef<Path>, registry: Arc<ClassRegistry>) -> Result<Self> {
        Self::with_options(file, registry, DirectoryOptions::default())
    }

    /// Only [`DirectoryOptions::cwd`] applies to a single file.
    pub fn with_options(
        file: impl AsRef<Path>,
        registry: Arc<ClassRegistry>,
        options: DirectoryOptions,
    ) -> Result<Self> {
        let file = options.absolute(file.as_ref())?;
        if file.is_dir() {
            return Err(CompositionError::InvalidCatalogInput(format!(
                "'{}' is a directory",
                file.display()
            )));
        }
        Ok(Self { file, registry })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl Catalog for FileCatalog {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        let text = std::fs::read_to_string(&self.file)
            .map_err(|e| CompositionError::catalog(self.describe(), e))?;
        parse_manifest(&self.file, &text, &self.registry)
    }

    fn list_classes(&self) -> BoxFuture<'_, Result<Vec<ClassDescriptor>>> {
        Box::pin(async move {
            if Handle::try_current().is_err() {
                return self.list_classes_sync();
            }
            let text = tokio::fs::read_to_string(&self.file)
                .await
                .map_err(|e| CompositionError::catalog(self.describe(), e))?;
            parse_manifest(&self.file, &text, &self.registry)
        })
    }

    fn describe(&self) -> String {
        format!("file:{}", self.file.display())
    }
}
