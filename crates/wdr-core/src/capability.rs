//! Capability registry.
//!
//! Holds the authoritative, insertion-ordered list of capability identifiers
//! this deployment can support, independent of which ones are currently
//! backed by a registered contract. The registry is filled once during
//! startup and then shared read-only (typically behind an `Arc`).

use indexmap::IndexMap;

use crate::error::{RegistryError, Result};
use crate::id::CapabilityId;

/// Published capability identifiers.
pub mod well_known {
    /// Read/write access to the workflow definition store.
    pub const WDR_STORE_ACCESS: &str = "WdrStoreAccess";
    /// Read/write access to FHIR questionnaire definitions.
    pub const FHIR_QUESTIONAIRE_STORE_ACCESS: &str = "FhirQuestionaireStoreAccess";
}

/// A registered capability and its human-readable semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub id: CapabilityId,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    entries: IndexMap<CapabilityId, CapabilityDescriptor>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the published capabilities, in publication order.
    pub fn well_known() -> Self {
        let mut registry = Self::new();
        for (id, description) in [
            (
                well_known::WDR_STORE_ACCESS,
                "read/write access to the workflow definition store",
            ),
            (
                well_known::FHIR_QUESTIONAIRE_STORE_ACCESS,
                "read/write access to FHIR questionnaire definitions",
            ),
        ] {
            registry.entries.insert(
                CapabilityId::new(id),
                CapabilityDescriptor {
                    id: CapabilityId::new(id),
                    description: Some(description.to_string()),
                },
            );
        }
        registry
    }

    /// Registers a capability.
    ///
    /// Fails with [`RegistryError::DuplicateCapability`] on an exact,
    /// case-sensitive match with an existing entry.
    pub fn register(&mut self, id: impl Into<CapabilityId>) -> Result<()> {
        self.insert(id.into(), None)
    }

    pub fn register_with_description(
        &mut self,
        id: impl Into<CapabilityId>,
        description: impl Into<String>,
    ) -> Result<()> {
        self.insert(id.into(), Some(description.into()))
    }

    fn insert(&mut self, id: CapabilityId, description: Option<String>) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(RegistryError::duplicate_capability(id.into_inner()));
        }
        tracing::debug!(capability = %id, "Registered capability");
        self.entries.insert(id.clone(), CapabilityDescriptor { id, description });
        Ok(())
    }

    /// All registered capabilities in insertion order.
    pub fn list_all(&self) -> impl Iterator<Item = &CapabilityId> {
        self.entries.keys()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Insertion position of a capability, used to order grants consistently.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.get_index_of(id)
    }

    pub fn describe(&self, id: &str) -> Option<&CapabilityDescriptor> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_exists() {
        let mut registry = CapabilityRegistry::new();
        registry.register("WdrStoreAccess").unwrap();
        assert!(registry.exists("WdrStoreAccess"));
        assert!(!registry.exists("wdrstoreaccess"));
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = CapabilityRegistry::new();
        registry.register("WdrStoreAccess").unwrap();
        let err = registry.register("WdrStoreAccess").unwrap_err();
        assert_eq!(err, RegistryError::duplicate_capability("WdrStoreAccess"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_all_keeps_insertion_order() {
        let mut registry = CapabilityRegistry::new();
        registry.register("Zeta").unwrap();
        registry.register("Alpha").unwrap();
        registry.register("Mid").unwrap();

        let ids: Vec<&str> = registry.list_all().map(CapabilityId::as_str).collect();
        assert_eq!(ids, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(registry.position("Alpha"), Some(1));
    }

    #[test]
    fn test_well_known() {
        let registry = CapabilityRegistry::well_known();
        let ids: Vec<&str> = registry.list_all().map(CapabilityId::as_str).collect();
        assert_eq!(ids, vec!["WdrStoreAccess", "FhirQuestionaireStoreAccess"]);
        assert!(
            registry
                .describe("WdrStoreAccess")
                .and_then(|d| d.description.as_deref())
                .is_some()
        );
    }
}
