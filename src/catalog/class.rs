use super::{Catalog, ClassRegistry};
use crate::composable::Export;
use crate::descriptor::ClassDescriptor;
use crate::error::Result;

/// Catalog holding exactly one class.
#[derive(Debug, Clone)]
pub struct ClassCatalog {
    class: ClassDescriptor,
}

impl ClassCatalog {
    pub fn new(class: ClassDescriptor) -> Self {
        Self { class }
    }

    pub fn of<T: Export>() -> Self {
        Self::new(ClassDescriptor::of::<T>())
    }

    /// Look the class up by name in `registry`.
    ///
    /// Fails with [`InvalidCatalogInput`](crate::CompositionError::InvalidCatalogInput)
    /// when no class is registered under `name`.
    pub fn from_registry(registry: &ClassRegistry, name: &str) -> Result<Self> {
        registry.resolve(name).map(Self::new)
    }

    pub fn class(&self) -> &ClassDescriptor {
        &self.class
    }
}

impl Catalog for ClassCatalog {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        Ok(vec![self.class.clone()])
    }

    fn describe(&self) -> String {
        format!("class:{}", self.class.short_name())
    }
}
