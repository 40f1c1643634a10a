use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Instance, Part};
use crate::key::ServiceKey;

/// How many providers an import accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one matching provider.
    Single,
    /// Any number of matching providers, including none.
    Many,
}

/// Declared request for provider instance(s) matching `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDefinition {
    pub property: &'static str,
    pub key: ServiceKey,
    pub cardinality: Cardinality,
}

/// An object that declares imports.
pub trait Importable: Send + Sync {
    /// Typed field descriptors for every import slot of this object.
    fn imports(&self) -> Vec<ImportBinding<'_>> {
        Vec::new()
    }
}

/// An import definition bound to the slot that receives the result.
pub struct ImportBinding<'a> {
    definition: ImportDefinition,
    target: ImportTarget<'a>,
}

pub(crate) enum ImportTarget<'a> {
    Single(&'a Import),
    Many(&'a ImportMany),
}

impl<'a> ImportBinding<'a> {
    pub fn single(property: &'static str, key: impl Into<ServiceKey>, slot: &'a Import) -> Self {
        Self {
            definition: ImportDefinition {
                property,
                key: key.into(),
                cardinality: Cardinality::Single,
            },
            target: ImportTarget::Single(slot),
        }
    }

    pub fn many(property: &'static str, key: impl Into<ServiceKey>, slot: &'a ImportMany) -> Self {
        Self {
            definition: ImportDefinition {
                property,
                key: key.into(),
                cardinality: Cardinality::Many,
            },
            target: ImportTarget::Many(slot),
        }
    }

    pub fn definition(&self) -> &ImportDefinition {
        &self.definition
    }

    pub(crate) fn target(&self) -> &ImportTarget<'a> {
        &self.target
    }
}

/// Slot for a [`Cardinality::Single`] import.
#[derive(Default)]
pub struct Import {
    slot: RwLock<Option<Instance>>,
}

impl Import {
    pub fn new() -> Self {
        Self::default()
    }

    /// The assigned instance, if composition has run.
    pub fn get(&self) -> Option<Instance> {
        self.slot.read().clone()
    }

    /// The assigned instance as its concrete type.
    pub fn downcast<T: Part>(&self) -> Option<Arc<T>> {
        self.get()?.downcast_arc::<T>().ok()
    }

    pub fn is_satisfied(&self) -> bool {
        self.slot.read().is_some()
    }

    pub(crate) fn set(&self, instance: Instance) {
        *self.slot.write() = Some(instance);
    }

    pub(crate) fn clear(&self) {
        self.slot.write().take();
    }
}

impl fmt::Debug for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Import")
            .field("satisfied", &self.is_satisfied())
            .finish()
    }
}

/// Slot for a [`Cardinality::Many`] import.
#[derive(Default)]
pub struct ImportMany {
    slot: RwLock<Vec<Instance>>,
}

impl ImportMany {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigned instances in provider creation order.
    pub fn get(&self) -> Vec<Instance> {
        self.slot.read().clone()
    }

    /// Assigned instances of concrete type `T`; others are skipped.
    pub fn downcast_all<T: Part>(&self) -> Vec<Arc<T>> {
        self.get()
            .into_iter()
            .filter_map(|instance| instance.downcast_arc::<T>().ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().is_empty()
    }

    pub(crate) fn set(&self, instances: Vec<Instance>) {
        *self.slot.write() = instances;
    }

    pub(crate) fn clear(&self) {
        self.slot.write().clear();
    }
}

impl fmt::Debug for ImportMany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportMany").field("len", &self.len()).finish()
    }
}
