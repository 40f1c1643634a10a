use tracing::trace;

use super::Provider;
use crate::composable::import::ImportTarget;
use crate::composable::{Importable, Instance};
use crate::error::{CompositionError, Result};
use crate::key::ServiceKey;

fn matching<'a>(providers: &'a [Provider], key: &'a ServiceKey) -> impl Iterator<Item = &'a Provider> {
    providers.iter().filter(move |provider| provider.key() == key)
}

/// The only provider exported under `key`.
pub(crate) fn single(providers: &[Provider], key: &ServiceKey) -> Result<Instance> {
    let mut found = matching(providers, key);
    match (found.next(), found.next()) {
        (None, _) => Err(CompositionError::NotFound { key: key.clone() }),
        (Some(provider), None) => Ok(provider.instance().clone()),
        (Some(_), Some(_)) => Err(CompositionError::AmbiguousService {
            key: key.clone(),
            count: 2 + found.count(),
        }),
    }
}

/// Every provider exported under `key`, in creation order.
pub(crate) fn many(providers: &[Provider], key: &ServiceKey) -> Vec<Instance> {
    matching(providers, key)
        .map(|provider| provider.instance().clone())
        .collect()
}

/// Assign matching providers to every import slot of `target`.
pub(crate) fn satisfy<T: Importable + ?Sized>(providers: &[Provider], target: &T) -> Result<()> {
    for binding in target.imports() {
        let definition = binding.definition();
        match binding.target() {
            ImportTarget::Single(slot) => {
                slot.set(single(providers, &definition.key)?);
                trace!(property = definition.property, key = %definition.key, "satisfied import");
            }
            ImportTarget::Many(slot) => {
                let instances = many(providers, &definition.key);
                trace!(
                    property = definition.property,
                    key = %definition.key,
                    count = instances.len(),
                    "satisfied import"
                );
                slot.set(instances);
            }
        }
    }
    Ok(())
}

/// Empty every import slot of `target`.
pub(crate) fn release<T: Importable + ?Sized>(target: &T) {
    for binding in target.imports() {
        match binding.target() {
            ImportTarget::Single(slot) => slot.clear(),
            ImportTarget::Many(slot) => slot.clear(),
        }
    }
}
