use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::composable::{Export, Instance};
use crate::key::ServiceKey;

/// One service key a class is exported under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportDefinition {
    key: ServiceKey,
}

impl ExportDefinition {
    pub fn new(key: impl Into<ServiceKey>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }
}

/// Descriptor of a constructible class and the keys it exports.
///
/// Built from the static metadata of an [`Export`] type. Every export
/// definition yields its own instance during realization.
#[derive(Clone)]
pub struct ClassDescriptor {
    name: &'static str,
    type_id: TypeId,
    exports: Arc<[ExportDefinition]>,
    factory: fn() -> Instance,
}

impl ClassDescriptor {
    /// Create a descriptor for `T`.
    pub fn of<T: Export>() -> Self {
        Self {
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            exports: T::exports().into(),
            factory: construct::<T>,
        }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn exports(&self) -> &[ExportDefinition] {
        &self.exports
    }

    pub(crate) fn instantiate(&self) -> Instance {
        (self.factory)()
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("exports", &self.exports)
            .finish()
    }
}

fn construct<T: Export>() -> Instance {
    Arc::new(T::default())
}

pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}
