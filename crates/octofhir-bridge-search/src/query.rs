//! Search composition and execution.
//!
//! A [`SearchQueryBuilder`] wires a store, a translator, and the optional
//! chain/include collaborators once; [`compose`](SearchQueryBuilder::compose)
//! then validates a parameter map into an executable [`SearchQuery`].
//! Execution compiles the map into a store predicate, resolves matching
//! identifiers, and translates the requested window.

use std::sync::Arc;

use async_trait::async_trait;
use octofhir_bridge_core::{
    BridgeError, DomainEntity, EntityReference, FhirResource, PageConfig, PageRequest,
    PagedResult, Result, Translator,
};
use octofhir_bridge_store::{Clause, Condition, DomainStore, Predicate};
use tracing::{debug, warn};

use crate::chain::{ChainResolver, validate_chains};
use crate::include::{IncludeResolver, IncludeSource};
use crate::merged::ResultProvider;
use crate::params::SearchParameterMap;
use crate::types;

/// Reusable wiring for composing queries over one entity type.
pub struct SearchQueryBuilder<U, T>
where
    U: DomainEntity,
{
    store: Arc<dyn DomainStore<U>>,
    translator: Arc<dyn Translator<U, T>>,
    chains: Option<Arc<dyn ChainResolver>>,
    includes: Option<Arc<dyn IncludeSource>>,
    config: PageConfig,
}

impl<U, T> SearchQueryBuilder<U, T>
where
    U: DomainEntity,
    T: FhirResource,
{
    /// Creates a builder without chain or include support.
    #[must_use]
    pub fn new(store: Arc<dyn DomainStore<U>>, translator: Arc<dyn Translator<U, T>>) -> Self {
        Self {
            store,
            translator,
            chains: None,
            includes: None,
            config: PageConfig::default(),
        }
    }

    /// Enables chained reference criteria.
    #[must_use]
    pub fn with_chain_resolver(mut self, chains: Arc<dyn ChainResolver>) -> Self {
        self.chains = Some(chains);
        self
    }

    /// Enables include and reverse-include directives.
    #[must_use]
    pub fn with_include_source(mut self, includes: Arc<dyn IncludeSource>) -> Self {
        self.includes = Some(includes);
        self
    }

    /// Overrides the default paging limits.
    #[must_use]
    pub fn with_page_config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates `map` and binds it into an executable query.
    ///
    /// Chained criteria are checked here, before execution: chains deeper
    /// than one link, chains without a target type, and chains into
    /// parameters the resolver does not know all fail fast.
    pub fn compose(&self, map: SearchParameterMap) -> Result<SearchQuery<U, T>> {
        validate_chains(&map, self.chains.as_ref())?;
        Ok(SearchQuery {
            store: self.store.clone(),
            translator: self.translator.clone(),
            chains: self.chains.clone(),
            includes: self.includes.clone(),
            config: self.config.clone(),
            map,
        })
    }
}

/// A validated, executable search over one entity type.
pub struct SearchQuery<U, T>
where
    U: DomainEntity,
{
    store: Arc<dyn DomainStore<U>>,
    translator: Arc<dyn Translator<U, T>>,
    chains: Option<Arc<dyn ChainResolver>>,
    includes: Option<Arc<dyn IncludeSource>>,
    config: PageConfig,
    map: SearchParameterMap,
}

impl<U, T> SearchQuery<U, T>
where
    U: DomainEntity,
    T: FhirResource,
{
    /// The parameter map this query was composed from.
    pub fn map(&self) -> &SearchParameterMap {
        &self.map
    }

    /// Compiles the parameter map into a store predicate, resolving
    /// chained criteria into identifier sets.
    async fn compile(&self) -> Result<Predicate> {
        if let Some(raw) = self.map.everything() {
            let ids: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
            debug!(ids = ids.len(), "compiled identifier-pinned predicate");
            return Ok(Predicate::new().and(Clause::single(Condition::IdIn(ids))));
        }

        let mut predicate = Predicate::new();
        for (name, groups) in self.map.references() {
            for group in groups {
                // An empty OR-group constrains nothing.
                if group.is_empty() {
                    continue;
                }
                let mut targets = Vec::new();
                for value in group.values() {
                    match (&value.chain, &value.target_type) {
                        (Some(parameter), Some(target_type)) => {
                            let Some(resolver) = &self.chains else {
                                return Err(BridgeError::internal(
                                    "chained criterion reached compilation without a resolver",
                                ));
                            };
                            let ids =
                                resolver.resolve(target_type, parameter, &value.value).await?;
                            targets.extend(
                                ids.into_iter()
                                    .map(|id| EntityReference::typed(target_type.clone(), id)),
                            );
                        }
                        (Some(parameter), None) => {
                            return Err(BridgeError::invalid_request(format!(
                                "chained parameter '{name}.{parameter}' needs an explicit target type"
                            )));
                        }
                        (None, _) => targets.push(value.to_target()),
                    }
                }
                // A chain that resolved to nothing must match nothing, so
                // the clause is kept even with an empty target set.
                predicate.push(Clause::single(Condition::Reference {
                    field: name.to_string(),
                    targets,
                }));
            }
        }
        for (name, groups) in self.map.tokens() {
            for group in groups {
                if let Some(clause) = types::token::to_clause(name, group) {
                    predicate.push(clause);
                }
            }
        }
        for (name, groups) in self.map.dates() {
            for group in groups {
                if let Some(clause) = types::date::to_clause(name, group)? {
                    predicate.push(clause);
                }
            }
        }
        for (name, groups) in self.map.quantities() {
            for group in groups {
                if let Some(clause) = types::quantity::to_clause(name, group) {
                    predicate.push(clause);
                }
            }
        }
        for (name, groups) in self.map.strings() {
            for group in groups {
                if let Some(clause) = types::string::to_clause(name, group) {
                    predicate.push(clause);
                }
            }
        }
        debug!(clauses = predicate.clauses().len(), "compiled search predicate");
        Ok(predicate)
    }

    /// Runs the search and returns the requested page with its total and
    /// any included resources.
    pub async fn execute(&self, request: PageRequest) -> Result<PagedResult<T>> {
        let predicate = self.compile().await?;
        let ids = self.store.resolve(&predicate).await?;
        let total = ids.len();
        let (offset, count) = request.normalize(&self.config);

        let items: Vec<T> = if count == 0 || offset >= total {
            Vec::new()
        } else {
            let entities = self.store.fetch(&ids, offset, count, self.map.sort()).await?;
            entities
                .iter()
                .map(|entity| self.translator.to_resource(entity))
                .collect::<Result<_>>()?
        };

        let mut page = PagedResult::new(items, total, offset, count);
        let wants_includes =
            !self.map.includes().is_empty() || !self.map.rev_includes().is_empty();
        if wants_includes {
            match &self.includes {
                Some(source) if !page.items.is_empty() => {
                    let docs = page
                        .items
                        .iter()
                        .map(serde_json::to_value)
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(|err| {
                            BridgeError::internal(format!("serializing page items: {err}"))
                        })?;
                    let included = IncludeResolver::new(source.clone())
                        .resolve(&docs, self.map.includes(), self.map.rev_includes())
                        .await?;
                    page = page.with_included(included);
                }
                Some(_) => {}
                None => {
                    warn!("include directives ignored: no include source configured");
                }
            }
        }
        debug!(
            total,
            returned = page.items.len(),
            included = page.included.len(),
            "search executed"
        );
        Ok(page)
    }
}

#[async_trait]
impl<U, T> ResultProvider<T> for SearchQuery<U, T>
where
    U: DomainEntity,
    T: FhirResource,
{
    async fn total(&self) -> Result<usize> {
        let predicate = self.compile().await?;
        Ok(self.store.count(&predicate).await?)
    }

    async fn page(&self, offset: usize, count: usize) -> Result<Vec<T>> {
        let predicate = self.compile().await?;
        let ids = self.store.resolve(&predicate).await?;
        if count == 0 || offset >= ids.len() {
            return Ok(Vec::new());
        }
        let entities = self.store.fetch(&ids, offset, count, self.map.sort()).await?;
        entities
            .iter()
            .map(|entity| self.translator.to_resource(entity))
            .collect()
    }
}
