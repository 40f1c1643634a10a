//! Classes registered into the running binary at link time.
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct Clock;
//! impl Importable for Clock {}
//! impl Part for Clock {}
//! impl Export for Clock {}
//!
//! service_composer::register_class!(Clock);
//! ```

use linkme::distributed_slice;

use super::Catalog;
use crate::descriptor::ClassDescriptor;
use crate::error::Result;

/// Link-time table of class constructors, filled by [`register_class!`](crate::register_class).
#[distributed_slice]
pub static APPLICATION_CLASSES: [fn() -> ClassDescriptor];

/// Catalog over every class in [`APPLICATION_CLASSES`].
///
/// Order follows the linker's placement of the entries, which is stable for
/// a given binary but not across crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationCatalog;

impl ApplicationCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl Catalog for ApplicationCatalog {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        Ok(APPLICATION_CLASSES.iter().map(|entry| entry()).collect())
    }

    fn describe(&self) -> String {
        "application".to_string()
    }
}

/// Register an [`Export`](crate::Export) type with the [`ApplicationCatalog`].
#[macro_export]
macro_rules! register_class {
    ($ty:ty) => {
        const _: () = {
            #[$crate::linkme::distributed_slice($crate::APPLICATION_CLASSES)]
            #[linkme(crate = $crate::linkme)]
            static ENTRY: fn() -> $crate::ClassDescriptor = $crate::ClassDescriptor::of::<$ty>;
        };
    };
}
