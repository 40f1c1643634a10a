pub mod import;

use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};

use crate::descriptor::ExportDefinition;
use crate::error::BoxError;
use crate::key::ServiceKey;

pub use import::{Cardinality, Import, ImportBinding, ImportDefinition, ImportMany, Importable};

/// Shared handle to a provider instance.
pub type Instance = Arc<dyn Part>;

/// An object the container can create, wire and dispose.
///
/// Every provider is a `Part`. Consumers passed to
/// [`CompositionContainer::compose`](crate::CompositionContainer::compose)
/// only need [`Importable`].
pub trait Part: Importable + DowncastSync {
    /// Disposal capability, if this part owns resources.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

impl_downcast!(sync Part);

/// A part class that is exported under one or more service keys.
///
/// `Default` is the no-argument constructor used during realization.
pub trait Export: Part + Default {
    /// Keys this class is exported under, in declaration order.
    ///
    /// Defaults to the class's own type key.
    fn exports() -> Vec<ExportDefinition> {
        vec![ExportDefinition::new(ServiceKey::of::<Self>())]
    }
}

/// Releases resources held by a part.
pub trait Disposable {
    fn dispose(&self) -> Result<(), BoxError>;
}
