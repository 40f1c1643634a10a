mod gate;
mod resolve;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::catalog::{
    ApplicationCatalog, Catalog, ClassCatalog, ClassRegistry, DirectoryCatalog, FileCatalog,
    Module, ModuleCatalog,
};
use crate::composable::{Export, Importable, Instance, Part};
use crate::config::{ContainerConfig, LateRegistration};
use crate::descriptor::ClassDescriptor;
use crate::error::{CompositionError, DisposeFailure, Result};
use crate::key::ServiceKey;

use gate::{Entry, Gate, Providers};

/// A realized provider: one instance per export definition.
#[derive(Clone)]
pub struct Provider {
    instance: Instance,
    key: ServiceKey,
    class: &'static str,
}

impl Provider {
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// Type name of the class the instance was created from.
    pub fn class(&self) -> &'static str {
        self.class
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("class", &self.class)
            .field("key", &self.key)
            .finish()
    }
}

/// Container that discovers parts through catalogs and wires them by key.
///
/// Providers are created on the first composition or lookup, once for the
/// container's lifetime, and then wired to each other. Catalogs are added
/// up front; see [`LateRegistration`] for adds after realization.
/// [`dispose`](Self::dispose) is terminal.
///
/// Both the async and the `_sync` entry points share one realization, so
/// they always observe the same providers. A sync call made on a runtime
/// thread blocks that thread while an async realization is in flight.
pub struct CompositionContainer {
    config: ContainerConfig,
    catalogs: Vec<Box<dyn Catalog>>,
    gate: Gate,
}

impl CompositionContainer {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            catalogs: Vec::new(),
            gate: Gate::new(),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Add a catalog. Catalogs are queried in the order they were added.
    pub fn add_catalog(&mut self, catalog: impl Catalog + 'static) -> Result<&mut Self> {
        if self.gate.is_disposed() {
            return Err(CompositionError::Disposed);
        }
        if self.gate.is_realized() {
            match self.config.late_registration {
                LateRegistration::Reject => return Err(CompositionError::LateRegistration),
                LateRegistration::Ignore => {
                    warn!(catalog = %catalog.describe(), "ignoring catalog added after realization");
                    return Ok(self);
                }
            }
        }
        debug!(catalog = %catalog.describe(), "catalog added");
        self.catalogs.push(Box::new(catalog));
        Ok(self)
    }

    pub fn add_class<T: Export>(&mut self) -> Result<&mut Self> {
        self.add_catalog(ClassCatalog::of::<T>())
    }

    pub fn add_module(&mut self, module: Module) -> Result<&mut Self> {
        self.add_catalog(ModuleCatalog::new(module))
    }

    /// Add every class registered with [`register_class!`](crate::register_class).
    pub fn add_application(&mut self) -> Result<&mut Self> {
        self.add_catalog(ApplicationCatalog::new())
    }

    /// Add a manifest directory using the configured patterns and exclusions.
    pub fn add_directory(
        &mut self,
        directory: impl AsRef<Path>,
        registry: Arc<ClassRegistry>,
    ) -> Result<&mut Self> {
        let catalog =
            DirectoryCatalog::with_options(directory, registry, self.config.directory_options())?;
        self.add_catalog(catalog)
    }

    pub fn add_file(&mut self, file: impl AsRef<Path>, registry: Arc<ClassRegistry>) -> Result<&mut Self> {
        self.add_catalog(FileCatalog::new(file, registry)?)
    }

    pub fn catalog_count(&self) -> usize {
        self.catalogs.len()
    }

    /// Realized providers in creation order, if realization has run.
    pub fn providers(&self) -> Option<Arc<[Provider]>> {
        self.gate.providers()
    }

    pub fn is_realized(&self) -> bool {
        self.gate.is_realized()
    }

    pub fn is_disposed(&self) -> bool {
        self.gate.is_disposed()
    }

    async fn realized(&self) -> Result<Providers> {
        let pending = match self.gate.enter().await? {
            Entry::Ready(providers) => return Ok(providers),
            Entry::Realize(pending) => pending,
        };

        let span = info_span!("realize", mode = "async", catalogs = self.catalogs.len());
        let classes = async {
            let mut classes = Vec::new();
            for catalog in &self.catalogs {
                let listed = catalog.list_classes().await?;
                debug!(catalog = %catalog.describe(), classes = listed.len(), "catalog listed");
                classes.extend(listed);
            }
            Ok::<_, CompositionError>(classes)
        }
        .instrument(span.clone())
        .await?;

        span.in_scope(|| {
            let providers = pending.complete(instantiate(&classes));
            wire(&providers)?;
            Ok(providers)
        })
    }

    fn realized_sync(&self) -> Result<Providers> {
        let pending = match self.gate.enter_sync()? {
            Entry::Ready(providers) => return Ok(providers),
            Entry::Realize(pending) => pending,
        };

        let _span =
            info_span!("realize", mode = "sync", catalogs = self.catalogs.len()).entered();
        let mut classes = Vec::new();
        for catalog in &self.catalogs {
            let listed = catalog.list_classes_sync()?;
            debug!(catalog = %catalog.describe(), classes = listed.len(), "catalog listed");
            classes.extend(listed);
        }
        let providers = pending.complete(instantiate(&classes));
        wire(&providers)?;
        Ok(providers)
    }

    /// Realize providers if needed, then satisfy the imports of `consumer`.
    pub async fn compose(&self, consumer: &dyn Importable) -> Result<()> {
        let providers = self.realized().await?;
        resolve::satisfy(&providers, consumer)
    }

    pub fn compose_sync(&self, consumer: &dyn Importable) -> Result<()> {
        let providers = self.realized_sync()?;
        resolve::satisfy(&providers, consumer)
    }

    /// Compose several consumers in order, stopping at the first failure.
    pub async fn compose_all(&self, consumers: &[&dyn Importable]) -> Result<()> {
        let providers = self.realized().await?;
        consumers
            .iter()
            .try_for_each(|consumer| resolve::satisfy(&providers, *consumer))
    }

    pub fn compose_all_sync(&self, consumers: &[&dyn Importable]) -> Result<()> {
        let providers = self.realized_sync()?;
        consumers
            .iter()
            .try_for_each(|consumer| resolve::satisfy(&providers, *consumer))
    }

    /// The single provider exported under `key`.
    ///
    /// Fails with [`CompositionError::NotFound`] when there is none and
    /// [`CompositionError::AmbiguousService`] when there are several.
    pub async fn get_service(&self, key: impl Into<ServiceKey>) -> Result<Instance> {
        let providers = self.realized().await?;
        resolve::single(&providers, &key.into())
    }

    pub fn get_service_sync(&self, key: impl Into<ServiceKey>) -> Result<Instance> {
        let providers = self.realized_sync()?;
        resolve::single(&providers, &key.into())
    }

    /// Every provider exported under `key`, in creation order. Never fails
    /// for zero matches.
    pub async fn get_all_services(&self, key: impl Into<ServiceKey>) -> Result<Vec<Instance>> {
        let providers = self.realized().await?;
        Ok(resolve::many(&providers, &key.into()))
    }

    pub fn get_all_services_sync(&self, key: impl Into<ServiceKey>) -> Result<Vec<Instance>> {
        let providers = self.realized_sync()?;
        Ok(resolve::many(&providers, &key.into()))
    }

    /// The single provider exported under `T`'s type key, as `T`.
    pub async fn get<T: Part>(&self) -> Result<Arc<T>> {
        let instance = self.get_service(ServiceKey::of::<T>()).await?;
        downcast::<T>(instance)
    }

    pub fn get_sync<T: Part>(&self) -> Result<Arc<T>> {
        let instance = self.get_service_sync(ServiceKey::of::<T>())?;
        downcast::<T>(instance)
    }

    /// Every provider exported under `T`'s type key that is a `T`.
    pub async fn get_all<T: Part>(&self) -> Result<Vec<Arc<T>>> {
        let instances = self.get_all_services(ServiceKey::of::<T>()).await?;
        Ok(downcast_all::<T>(instances))
    }

    pub fn get_all_sync<T: Part>(&self) -> Result<Vec<Arc<T>>> {
        let instances = self.get_all_services_sync(ServiceKey::of::<T>())?;
        Ok(downcast_all::<T>(instances))
    }

    /// Dispose every realized provider in reverse creation order.
    ///
    /// All disposal hooks run even if some fail; failures are returned
    /// together as [`CompositionError::Disposal`]. Provider import slots are
    /// emptied once the hooks have run. The container cannot be used for
    /// composition afterwards.
    pub fn dispose(&self) -> Result<()> {
        let Some(providers) = self.gate.close() else {
            debug!("container disposed before realization");
            return Ok(());
        };

        let mut failures = Vec::new();
        for provider in providers.iter().rev() {
            let Some(disposable) = provider.instance.as_disposable() else {
                continue;
            };
            if let Err(source) = disposable.dispose() {
                warn!(class = provider.class, key = %provider.key, error = %source, "dispose failed");
                failures.push(DisposeFailure {
                    class: provider.class,
                    key: provider.key.clone(),
                    source,
                });
            }
        }

        for provider in providers.iter() {
            resolve::release(&*provider.instance);
        }

        info!(providers = providers.len(), failures = failures.len(), "container disposed");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CompositionError::Disposal(failures))
        }
    }
}

impl Default for CompositionContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Instantiate one provider per export definition, in catalog order.
fn instantiate(classes: &[ClassDescriptor]) -> Providers {
    let mut providers = Vec::new();
    for class in classes {
        for export in class.exports() {
            debug!(class = class.name(), key = %export.key(), "creating provider");
            providers.push(Provider {
                instance: class.instantiate(),
                key: export.key().clone(),
                class: class.name(),
            });
        }
    }
    info!(classes = classes.len(), providers = providers.len(), "providers realized");
    providers.into()
}

/// Satisfy every provider's imports against the frozen list.
///
/// Runs after the list is frozen: a failure is reported to the caller but
/// the providers stay realized, so no export is ever constructed twice.
fn wire(providers: &[Provider]) -> Result<()> {
    for provider in providers {
        if let Err(err) = resolve::satisfy(providers, &*provider.instance) {
            warn!(class = provider.class, key = %provider.key, error = %err, "provider wiring failed");
            return Err(err);
        }
    }
    Ok(())
}

fn downcast<T: Part>(instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast_arc::<T>()
        .map_err(|_| CompositionError::TypeMismatch {
            key: ServiceKey::of::<T>(),
            expected: std::any::type_name::<T>(),
        })
}

fn downcast_all<T: Part>(instances: Vec<Instance>) -> Vec<Arc<T>> {
    instances
        .into_iter()
        .filter_map(|instance| instance.downcast_arc::<T>().ok())
        .collect()
}
