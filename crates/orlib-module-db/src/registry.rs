use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::descriptor::ModuleDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("problem id {id:?} is already registered")]
    DuplicateId { id: String },
    #[error("no problem registered under id {id:?}")]
    UnknownProblem { id: String },
}

/// Insertion-ordered table of module descriptors.
///
/// The registry is filled once at startup and then shared immutably; the
/// insertion order is the order in which the dashboard lays out its problems.
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    descriptors: IndexMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a static descriptor list, failing on the first
    /// duplicate id.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ModuleDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
        if self.descriptors.contains_key(&descriptor.id) {
            return Err(RegistryError::DuplicateId { id: descriptor.id });
        }
        debug!(problem = %descriptor.id, location = %descriptor.module_location, "registered problem");
        self.descriptors.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&ModuleDescriptor, RegistryError> {
        self.descriptors
            .get(id)
            .ok_or_else(|| RegistryError::UnknownProblem { id: id.to_string() })
    }

    /// Descriptors the dashboard should show, in registration order.
    ///
    /// The iterator is lazy and can be cloned to restart from the beginning.
    pub fn list_available(&self) -> Available<'_> {
        Available {
            inner: self.descriptors.values(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Iterator returned by [`ModuleRegistry::list_available`].
#[derive(Debug, Clone)]
pub struct Available<'a> {
    inner: indexmap::map::Values<'a, String, ModuleDescriptor>,
}

impl<'a> Iterator for Available<'a> {
    type Item = &'a ModuleDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find(|descriptor| descriptor.status.is_listed())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::descriptor::{ModuleLocation, ModuleStatus};

    fn descriptor(id: &str, status: ModuleStatus) -> ModuleDescriptor {
        ModuleDescriptor::new(
            id,
            format!("Problem {id}"),
            ModuleLocation::Builtin(id.into()),
            "MainWindow",
        )
        .with_status(status)
    }

    #[test]
    fn duplicate_ids_are_rejected_without_mutation() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(descriptor("p1", ModuleStatus::Complete))
            .unwrap();
        let mut clash = descriptor("p1", ModuleStatus::Incomplete);
        clash.title = "Impostor".into();
        let err = registry.register(clash).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId { id: "p1".into() });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("p1").unwrap().title, "Problem p1");
        assert_eq!(
            registry.get("p1").unwrap().status,
            ModuleStatus::Complete
        );
    }

    #[test]
    fn from_descriptors_stops_at_first_duplicate() {
        let err = ModuleRegistry::from_descriptors(vec![
            descriptor("a", ModuleStatus::Complete),
            descriptor("a", ModuleStatus::Complete),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { id } if id == "a"));
    }

    #[test]
    fn unknown_ids_fail_lookup() {
        let registry = ModuleRegistry::new();
        assert_eq!(
            registry.get("p9").unwrap_err(),
            RegistryError::UnknownProblem { id: "p9".into() }
        );
    }

    #[test]
    fn listing_keeps_order_and_hides_unavailable() {
        let registry = ModuleRegistry::from_descriptors(vec![
            descriptor("p1", ModuleStatus::Complete),
            descriptor("p2", ModuleStatus::Unavailable),
            descriptor("p4", ModuleStatus::Complete),
            descriptor("p5", ModuleStatus::Incomplete),
        ])
        .unwrap();

        let listed = registry.list_available();
        let ids: Vec<_> = listed.clone().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p4", "p5"]);

        let selectable: Vec<_> = listed.map(|d| d.is_selectable()).collect();
        assert_eq!(selectable, vec![true, true, false]);

        let again: Vec<_> = registry.list_available().map(|d| d.id.clone()).collect();
        assert_eq!(again, vec!["p1", "p4", "p5"]);
    }
}
