use indexmap::IndexMap;

use crate::composable::Export;
use crate::descriptor::ClassDescriptor;
use crate::error::{CompositionError, Result};

/// Name-to-class table used by manifest-backed catalogs.
///
/// Names are kept in registration order. Registering a name twice
/// replaces the earlier class but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassDescriptor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its short type name.
    pub fn register<T: Export>(&mut self) -> &mut Self {
        let class = ClassDescriptor::of::<T>();
        self.classes.insert(class.short_name().to_string(), class);
        self
    }

    /// Register `T` under an explicit name.
    pub fn register_as<T: Export>(&mut self, name: impl Into<String>) -> &mut Self {
        self.classes.insert(name.into(), ClassDescriptor::of::<T>());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<ClassDescriptor> {
        self.get(name).cloned().ok_or_else(|| {
            CompositionError::InvalidCatalogInput(format!("no class registered as '{name}'"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassDescriptor)> {
        self.classes.iter().map(|(name, class)| (name.as_str(), class))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
