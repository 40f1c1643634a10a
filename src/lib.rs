pub mod catalog;
pub mod composable;
pub mod composition;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod key;

pub use catalog::{
    APPLICATION_CLASSES, ApplicationCatalog, Catalog, CatalogFilter, ClassCatalog, ClassRegistry,
    DirectoryCatalog, DirectoryOptions, FileCatalog, FilteredCatalog, Module, ModuleCatalog,
};
pub use composable::{
    Cardinality, Disposable, Export, Import, ImportBinding, ImportDefinition, ImportMany,
    Importable, Instance, Part,
};
pub use composition::{CompositionContainer, Provider};
pub use config::{ContainerConfig, LateRegistration};
pub use descriptor::{ClassDescriptor, ExportDefinition};
pub use error::{BoxError, CompositionError, DisposeFailure, Result};
pub use key::{KeyValue, ServiceKey};

pub use linkme;
