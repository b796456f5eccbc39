//! The resource CRUD service over a domain store and translator pair.

use std::sync::Arc;

use octofhir_bridge_core::{
    BridgeError, ContextAwareTranslator, DomainEntity, FhirResource, Result, Translator,
    generate_id,
};
use octofhir_bridge_store::DomainStore;
use serde_json::Value;
use tracing::{debug, info};

use crate::patch::{self, PatchFormat};
use crate::validator::{AcceptAll, EntityValidator};

/// The result of an update: the stored resource plus whether it was
/// created rather than replaced. Callers map `created` to 200-vs-201
/// semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome<T> {
    pub resource: T,
    pub created: bool,
}

/// How incoming resources are applied to existing entities. Chosen at
/// construction from the translator's capability.
enum UpdateStrategy<U, T> {
    /// Build a fresh entity from the resource and carry the identifier over.
    Replace(Arc<dyn Translator<U, T>>),
    /// Merge the resource onto the existing entity, preserving domain
    /// state the resource does not carry.
    Merge(Arc<dyn ContextAwareTranslator<U, T>>),
}

impl<U, T> UpdateStrategy<U, T>
where
    U: DomainEntity,
{
    fn to_resource(&self, entity: &U) -> Result<T> {
        match self {
            Self::Replace(translator) => translator.to_resource(entity),
            Self::Merge(translator) => translator.to_resource(entity),
        }
    }

    fn to_entity(&self, resource: &T) -> Result<U> {
        match self {
            Self::Replace(translator) => translator.to_entity(resource),
            Self::Merge(translator) => translator.to_entity(resource),
        }
    }

    fn apply(&self, existing: U, incoming: &T) -> Result<U> {
        match self {
            Self::Replace(translator) => {
                let mut fresh = translator.to_entity(incoming)?;
                if let Some(id) = existing.id() {
                    fresh.set_id(id.to_string());
                }
                Ok(fresh)
            }
            Self::Merge(translator) => translator.merge_entity(existing, incoming),
        }
    }
}

/// CRUD and patch operations for one entity/resource pair.
///
/// The service owns the visibility rule for soft-deleted entities: they
/// are invisible to reads and deletes but still reachable by update and
/// patch, so an update can restore one.
pub struct ResourceService<U, T>
where
    U: DomainEntity,
{
    store: Arc<dyn DomainStore<U>>,
    strategy: UpdateStrategy<U, T>,
    validator: Arc<dyn EntityValidator<U>>,
    allow_upsert: bool,
}

impl<U, T> ResourceService<U, T>
where
    U: DomainEntity,
    T: FhirResource,
{
    /// Creates a service that replaces entities wholesale on update.
    #[must_use]
    pub fn new(store: Arc<dyn DomainStore<U>>, translator: Arc<dyn Translator<U, T>>) -> Self {
        Self {
            store,
            strategy: UpdateStrategy::Replace(translator),
            validator: Arc::new(AcceptAll),
            allow_upsert: false,
        }
    }

    /// Creates a service that merges updates onto the existing entity,
    /// preserving domain state the resource form does not carry.
    #[must_use]
    pub fn with_context_aware(
        store: Arc<dyn DomainStore<U>>,
        translator: Arc<dyn ContextAwareTranslator<U, T>>,
    ) -> Self {
        Self {
            store,
            strategy: UpdateStrategy::Merge(translator),
            validator: Arc::new(AcceptAll),
            allow_upsert: false,
        }
    }

    /// Installs a domain validator run before every persist.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn EntityValidator<U>>) -> Self {
        self.validator = validator;
        self
    }

    /// Permits update-to-missing-id to create, when the caller also asks
    /// for it.
    #[must_use]
    pub fn with_upsert(mut self, allow_upsert: bool) -> Self {
        self.allow_upsert = allow_upsert;
        self
    }

    /// Retrieves one resource. Voided entities answer `Gone`.
    pub async fn get(&self, id: &str) -> Result<T> {
        if id.trim().is_empty() {
            return Err(BridgeError::invalid_request("identifier must not be empty"));
        }
        let Some(entity) = self.store.get(id).await? else {
            return Err(BridgeError::not_found(U::type_name(), id));
        };
        if entity.is_voided() {
            return Err(BridgeError::gone(U::type_name(), id));
        }
        self.strategy.to_resource(&entity)
    }

    /// Retrieves whatever subset of `ids` resolves to live entities.
    /// Missing and voided identifiers are skipped, never an error.
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<T>> {
        let entities = self.store.get_many(ids).await?;
        entities
            .iter()
            .filter(|entity| !entity.is_voided())
            .map(|entity| self.strategy.to_resource(entity))
            .collect()
    }

    /// Creates a resource, assigning a fresh identifier when the resource
    /// carries none.
    pub async fn create(&self, resource: &T) -> Result<T> {
        let mut entity = self.strategy.to_entity(resource)?;
        if entity.id().is_none() {
            entity.set_id(generate_id());
        }
        self.validator.validate(&entity)?;
        let stored = self.store.create_or_update(entity).await?;
        debug!(
            resource_type = U::type_name(),
            id = stored.id().unwrap_or_default(),
            "created entity"
        );
        self.strategy.to_resource(&stored)
    }

    /// Updates the resource stored under `id`.
    ///
    /// The resource must carry the same identifier. A missing target is
    /// `NotFound` unless both `allow_create` and the service's upsert
    /// policy permit creating it under the client identifier.
    pub async fn update(
        &self,
        id: &str,
        resource: &T,
        allow_create: bool,
    ) -> Result<UpdateOutcome<T>> {
        if id.trim().is_empty() {
            return Err(BridgeError::invalid_request("identifier must not be empty"));
        }
        let Some(resource_id) = resource.id() else {
            return Err(BridgeError::invalid_request(
                "resource carries no identifier to update",
            ));
        };
        if resource_id != id {
            return Err(BridgeError::invalid_request(format!(
                "resource identifier '{resource_id}' does not match '{id}'"
            )));
        }

        match self.store.get(id).await? {
            Some(existing) => {
                let merged = self.strategy.apply(existing, resource)?;
                self.validator.validate(&merged)?;
                let stored = self.store.create_or_update(merged).await?;
                debug!(resource_type = U::type_name(), id, "updated entity");
                Ok(UpdateOutcome {
                    resource: self.strategy.to_resource(&stored)?,
                    created: false,
                })
            }
            None => {
                if !(allow_create && self.allow_upsert) {
                    return Err(BridgeError::not_found(U::type_name(), id));
                }
                let mut entity = self.strategy.to_entity(resource)?;
                entity.set_id(id.to_string());
                self.validator.validate(&entity)?;
                let stored = self.store.create_or_update(entity).await?;
                info!(resource_type = U::type_name(), id, "created entity via update");
                Ok(UpdateOutcome {
                    resource: self.strategy.to_resource(&stored)?,
                    created: true,
                })
            }
        }
    }

    /// Applies a patch to the stored resource, all-or-nothing, then runs
    /// the result through [`update`](Self::update).
    pub async fn patch(&self, id: &str, format: PatchFormat, body: &str) -> Result<T> {
        if id.trim().is_empty() {
            return Err(BridgeError::invalid_request("identifier must not be empty"));
        }
        let Some(entity) = self.store.get(id).await? else {
            return Err(BridgeError::not_found(U::type_name(), id));
        };
        let resource = self.strategy.to_resource(&entity)?;
        let doc: Value = serde_json::to_value(&resource)
            .map_err(|err| BridgeError::internal(format!("serializing resource: {err}")))?;
        let patched_doc = patch::apply(format, &doc, body)?;
        let patched: T = serde_json::from_value(patched_doc).map_err(|err| {
            BridgeError::invalid_request(format!(
                "patched document is no longer a valid {} resource: {err}",
                T::type_name()
            ))
        })?;
        debug!(resource_type = U::type_name(), id, ?format, "applied patch");
        Ok(self.update(id, &patched, false).await?.resource)
    }

    /// Soft-deletes the entity. Absent and already-voided entities both
    /// answer `NotFound`.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(BridgeError::invalid_request("identifier must not be empty"));
        }
        match self.store.get(id).await? {
            Some(entity) if !entity.is_voided() => {
                self.store.delete(id).await?;
                debug!(resource_type = U::type_name(), id, "deleted entity");
                Ok(())
            }
            _ => Err(BridgeError::not_found(U::type_name(), id)),
        }
    }
}
