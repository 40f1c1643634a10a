//! Sources of class descriptors.
//!
//! A [`Catalog`] lists [`ClassDescriptor`]s, either immediately
//! ([`Catalog::list_classes_sync`]) or by suspending ([`Catalog::list_classes`]).
//! Both forms must return the same sequence for the same catalog state, and
//! listing never mutates the container. An empty list is a valid answer.

pub mod application;
pub mod class;
pub mod directory;
pub mod filtered;
pub mod module;
pub mod registry;

use std::any::type_name;
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use crate::descriptor::ClassDescriptor;
use crate::error::Result;

pub use application::{APPLICATION_CLASSES, ApplicationCatalog};
pub use class::ClassCatalog;
pub use directory::{DirectoryCatalog, DirectoryOptions, FileCatalog};
pub use filtered::{CatalogFilter, FilteredCatalog};
pub use module::{Module, ModuleCatalog};
pub use registry::ClassRegistry;

pub trait Catalog: Send + Sync {
    /// List classes without suspending.
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>>;

    /// List classes, possibly suspending on I/O.
    fn list_classes(&self) -> BoxFuture<'_, Result<Vec<ClassDescriptor>>> {
        Box::pin(future::ready(self.list_classes_sync()))
    }

    /// Name used in logs and errors.
    fn describe(&self) -> String {
        type_name::<Self>().to_string()
    }
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        (**self).list_classes_sync()
    }

    fn list_classes(&self) -> BoxFuture<'_, Result<Vec<ClassDescriptor>>> {
        (**self).list_classes()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<C: Catalog + ?Sized> Catalog for Box<C> {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        (**self).list_classes_sync()
    }

    fn list_classes(&self) -> BoxFuture<'_, Result<Vec<ClassDescriptor>>> {
        (**self).list_classes()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
