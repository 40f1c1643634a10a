use futures::future::BoxFuture;

use super::Catalog;
use crate::descriptor::ClassDescriptor;
use crate::error::Result;

/// Predicate over `(class, index in base listing, base catalog)`.
pub type ClassPredicate<C> = Box<dyn Fn(&ClassDescriptor, usize, &C) -> bool + Send + Sync>;

/// Decorator that lists only the classes of a base catalog matching a predicate.
///
/// The base is queried again on every call; base ordering is kept.
pub struct FilteredCatalog<C: Catalog> {
    inner: C,
    predicate: ClassPredicate<C>,
}

impl<C: Catalog> FilteredCatalog<C> {
    pub fn new(
        inner: C,
        predicate: impl Fn(&ClassDescriptor, usize, &C) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            predicate: Box::new(predicate),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn apply(&self, classes: Vec<ClassDescriptor>) -> Vec<ClassDescriptor> {
        classes
            .into_iter()
            .enumerate()
            .filter(|(index, class)| (self.predicate)(class, *index, &self.inner))
            .map(|(_, class)| class)
            .collect()
    }
}

impl<C: Catalog> Catalog for FilteredCatalog<C> {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        self.inner.list_classes_sync().map(|classes| self.apply(classes))
    }

    fn list_classes(&self) -> BoxFuture<'_, Result<Vec<ClassDescriptor>>> {
        Box::pin(async move {
            let classes = self.inner.list_classes().await?;
            Ok(self.apply(classes))
        })
    }

    fn describe(&self) -> String {
        format!("filtered:{}", self.inner.describe())
    }
}

/// Extension methods for filtering the classes of any catalog.
pub trait CatalogFilter: Catalog + Sized {
    /// Keep classes for which `f(class, index, base)` holds.
    fn filter(
        self,
        f: impl Fn(&ClassDescriptor, usize, &Self) -> bool + Send + Sync + 'static,
    ) -> FilteredCatalog<Self> {
        FilteredCatalog::new(self, f)
    }

    /// Keep only classes whose short names are in `allow`.
    fn exposing(self, allow: &[&str]) -> FilteredCatalog<Self> {
        let allow: Vec<String> = allow.iter().map(|name| name.to_string()).collect();
        self.filter(move |class, _, _| allow.iter().any(|name| name == class.short_name()))
    }

    /// Remove classes whose short names are in `deny`; keep everything else.
    fn hiding(self, deny: &[&str]) -> FilteredCatalog<Self> {
        let deny: Vec<String> = deny.iter().map(|name| name.to_string()).collect();
        self.filter(move |class, _, _| !deny.iter().any(|name| name == class.short_name()))
    }
}

impl<T: Catalog + Sized> CatalogFilter for T {}
