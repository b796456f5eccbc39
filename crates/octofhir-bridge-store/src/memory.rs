//! In-memory reference implementation of [`DomainStore`].
//!
//! Backs integration tests and embedded use. Predicates are evaluated
//! against the serialized form of each entity, so any entity type works
//! without store-side schema knowledge.

use std::collections::HashMap;

use async_trait::async_trait;
use octofhir_bridge_core::DomainEntity;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::predicate::Predicate;
use crate::sort::SortOrder;
use crate::traits::DomainStore;

/// Thread-safe in-memory entity store.
pub struct MemoryStore<U> {
    entities: RwLock<HashMap<String, U>>,
}

impl<U: DomainEntity> MemoryStore<U> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entities, voided ones included.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    /// Whether the store holds no entities at all.
    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}

impl<U: DomainEntity> Default for MemoryStore<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<U: DomainEntity> DomainStore<U> for MemoryStore<U> {
    async fn get(&self, id: &str) -> Result<Option<U>, StoreError> {
        Ok(self.entities.read().await.get(id).cloned())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<U>, StoreError> {
        let entities = self.entities.read().await;
        Ok(ids.iter().filter_map(|id| entities.get(id)).cloned().collect())
    }

    async fn create_or_update(&self, entity: U) -> Result<U, StoreError> {
        let id = entity.id().ok_or(StoreError::MissingId)?.to_string();
        self.entities.write().await.insert(id.clone(), entity.clone());
        debug!(entity_type = U::type_name(), id = %id, "stored entity");
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> Result<Option<U>, StoreError> {
        let mut entities = self.entities.write().await;
        match entities.get_mut(id) {
            Some(entity) => {
                let prior = entity.clone();
                entity.set_voided(true);
                debug!(entity_type = U::type_name(), id = %id, "voided entity");
                Ok(Some(prior))
            }
            None => Ok(None),
        }
    }

    async fn resolve(&self, predicate: &Predicate) -> Result<Vec<String>, StoreError> {
        let entities = self.entities.read().await;
        let mut ids = Vec::new();
        for (id, entity) in entities.iter() {
            if entity.is_voided() {
                continue;
            }
            let doc = serde_json::to_value(entity)?;
            if predicate.matches(&doc) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn count(&self, predicate: &Predicate) -> Result<usize, StoreError> {
        Ok(self.resolve(predicate).await?.len())
    }

    async fn fetch(
        &self,
        ids: &[String],
        offset: usize,
        limit: usize,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<U>, StoreError> {
        let entities = self.entities.read().await;
        let mut selected: Vec<U> = ids
            .iter()
            .filter_map(|id| entities.get(id))
            .filter(|entity| !entity.is_voided())
            .cloned()
            .collect();
        drop(entities);

        if let Some(order) = sort {
            let mut pairs: Vec<(U, Value)> = Vec::with_capacity(selected.len());
            for entity in selected {
                let doc = serde_json::to_value(&entity)?;
                pairs.push((entity, doc));
            }
            pairs.sort_by(|a, b| order.compare(&a.1, &b.1));
            selected = pairs.into_iter().map(|(entity, _)| entity).collect();
        }

        Ok(selected.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Clause, Condition, StringComparison};
    use octofhir_bridge_core::EntityReference;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Visit {
        id: Option<String>,
        patient: String,
        started: String,
        location: String,
        voided: bool,
    }

    impl DomainEntity for Visit {
        fn type_name() -> &'static str {
            "Visit"
        }

        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_id(&mut self, id: String) {
            self.id = Some(id);
        }

        fn is_voided(&self) -> bool {
            self.voided
        }

        fn set_voided(&mut self, voided: bool) {
            self.voided = voided;
        }
    }

    fn visit(id: &str, patient: &str, started: &str, location: &str) -> Visit {
        Visit {
            id: Some(id.to_string()),
            patient: format!("Patient/{patient}"),
            started: started.to_string(),
            location: location.to_string(),
            voided: false,
        }
    }

    async fn seeded_store() -> MemoryStore<Visit> {
        let store = MemoryStore::new();
        for entity in [
            visit("v1", "p1", "2023-06-15T10:30:00Z", "Ward A"),
            visit("v2", "p1", "2023-01-02T08:00:00Z", "ICU"),
            visit("v3", "p2", "2023-03-20T14:00:00Z", "Ward B"),
        ] {
            store.create_or_update(entity).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = seeded_store().await;
        let found = store.get("v1").await.unwrap().unwrap();
        assert_eq!(found.location, "Ward A");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_requires_id() {
        let store: MemoryStore<Visit> = MemoryStore::new();
        let mut entity = visit("x", "p1", "2023-01-01", "Ward A");
        entity.id = None;
        let err = store.create_or_update(entity).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingId));
    }

    #[tokio::test]
    async fn test_get_many_keeps_order_and_drops_unknown() {
        let store = seeded_store().await;
        let found = store
            .get_many(&["v3".to_string(), "nope".to_string(), "v1".to_string()])
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|v| v.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["v3", "v1"]);
    }

    #[tokio::test]
    async fn test_delete_voids_but_keeps_entity() {
        let store = seeded_store().await;
        let prior = store.delete("v1").await.unwrap().unwrap();
        assert!(!prior.voided);

        // The entity still exists, flagged.
        let after = store.get("v1").await.unwrap().unwrap();
        assert!(after.voided);

        // And no longer resolves.
        let ids = store.resolve(&Predicate::new()).await.unwrap();
        assert_eq!(ids, vec!["v2", "v3"]);

        assert!(store.delete("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_with_predicate_in_stable_order() {
        let store = seeded_store().await;
        let predicate = Predicate::new().and(Clause::single(Condition::Reference {
            field: "patient".to_string(),
            targets: vec![EntityReference::typed("Patient", "p1")],
        }));
        let ids = store.resolve(&predicate).await.unwrap();
        assert_eq!(ids, vec!["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_count_agrees_with_resolve() {
        let store = seeded_store().await;
        let predicate = Predicate::new().and(Clause::single(Condition::Text {
            field: "location".to_string(),
            value: "ward".to_string(),
            comparison: StringComparison::StartsWith,
        }));
        let ids = store.resolve(&predicate).await.unwrap();
        let count = store.count(&predicate).await.unwrap();
        assert_eq!(count, ids.len());
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_fetch_sorts_then_windows() {
        let store = seeded_store().await;
        let all = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];

        let sorted = store
            .fetch(&all, 0, 10, Some(&SortOrder::asc("started")))
            .await
            .unwrap();
        let ids: Vec<_> = sorted.iter().map(|v| v.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["v2", "v3", "v1"]);

        let window = store
            .fetch(&all, 1, 1, Some(&SortOrder::desc("started")))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id.as_deref(), Some("v3"));

        // Without a sort the input order is kept.
        let unsorted = store.fetch(&all, 0, 2, None).await.unwrap();
        let ids: Vec<_> = unsorted.iter().map(|v| v.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
    }
}
