//! Include and reverse-include resolution for result pages.
//!
//! After a page of matches is translated, include directives pull in the
//! resources the page references (forward) and the resources referencing
//! the page (reverse). Included resources ride alongside the page and are
//! never counted in its total.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use octofhir_bridge_core::{BridgeError, Result, extract_references, resource_key};
use serde_json::Value;
use tracing::warn;

/// A forward include: pull in the resources a page item references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// The type the directive applies to (the searched type).
    pub source_type: String,
    /// Dot-separated reference field on the source resource.
    pub reference_field: String,
    /// Restricts which referenced type to pull in, when given.
    pub target_type: Option<String>,
}

impl IncludeDirective {
    /// Creates an untargeted include.
    pub fn new(source_type: impl Into<String>, reference_field: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            reference_field: reference_field.into(),
            target_type: None,
        }
    }

    /// Restricts the include to one referenced type.
    #[must_use]
    pub fn targeting(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    /// Parses `SourceType:field` or `SourceType:field:TargetType` notation.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(':').collect();
        match parts.as_slice() {
            [source, field] if !source.is_empty() && !field.is_empty() => {
                Ok(Self::new(*source, *field))
            }
            [source, field, target] if !source.is_empty() && !field.is_empty() => {
                Ok(Self::new(*source, *field).targeting(*target))
            }
            _ => Err(BridgeError::invalid_request(format!(
                "invalid include directive '{raw}'"
            ))),
        }
    }
}

/// A reverse include: pull in the resources that reference a page item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevIncludeDirective {
    /// The type whose resources reference the page items.
    pub referencing_type: String,
    /// Dot-separated reference field on the referencing resource.
    pub reference_field: String,
}

impl RevIncludeDirective {
    /// Creates a reverse include.
    pub fn new(referencing_type: impl Into<String>, reference_field: impl Into<String>) -> Self {
        Self {
            referencing_type: referencing_type.into(),
            reference_field: reference_field.into(),
        }
    }

    /// Parses `ReferencingType:field` notation.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once(':') {
            Some((referencing, field))
                if !referencing.is_empty() && !field.is_empty() && !field.contains(':') =>
            {
                Ok(Self::new(referencing, field))
            }
            _ => Err(BridgeError::invalid_request(format!(
                "invalid reverse include directive '{raw}'"
            ))),
        }
    }
}

/// Data access the resolver needs, independent of per-type wiring.
///
/// Implementations translate entities of the requested type to document
/// form and must only return live (non-voided) resources.
#[async_trait]
pub trait IncludeSource: Send + Sync {
    /// Loads resources of `target_type` by identifier.
    async fn load(&self, target_type: &str, ids: &[String]) -> Result<Vec<Value>>;

    /// Finds resources of `referencing_type` whose `reference_field`
    /// points at any of `ids`.
    async fn referencing(
        &self,
        referencing_type: &str,
        reference_field: &str,
        ids: &[String],
    ) -> Result<Vec<Value>>;
}

/// Resolves include and reverse-include directives for a page of
/// translated resources.
pub struct IncludeResolver {
    source: Arc<dyn IncludeSource>,
}

impl IncludeResolver {
    /// Creates a resolver over the given data source.
    #[must_use]
    pub fn new(source: Arc<dyn IncludeSource>) -> Self {
        Self { source }
    }

    /// Returns the supplementary resources for `page_docs`, de-duplicated
    /// by `(type, id)` against the page items and against each other.
    pub async fn resolve(
        &self,
        page_docs: &[Value],
        includes: &[IncludeDirective],
        rev_includes: &[RevIncludeDirective],
    ) -> Result<Vec<Value>> {
        let mut seen: HashSet<(String, String)> =
            page_docs.iter().filter_map(resource_key).collect();
        let mut included = Vec::new();

        for directive in includes {
            // Group wanted identifiers by their resolved target type.
            let mut wanted: IndexMap<String, Vec<String>> = IndexMap::new();
            for doc in page_docs {
                for reference in extract_references(doc, &directive.reference_field) {
                    let Some(target_type) = reference
                        .target_type
                        .clone()
                        .or_else(|| directive.target_type.clone())
                    else {
                        warn!(
                            field = %directive.reference_field,
                            id = %reference.id,
                            "skipping untyped reference: no target type to load it from"
                        );
                        continue;
                    };
                    if let Some(expected) = &directive.target_type
                        && *expected != target_type
                    {
                        continue;
                    }
                    let ids = wanted.entry(target_type).or_default();
                    if !ids.contains(&reference.id) {
                        ids.push(reference.id);
                    }
                }
            }
            for (target_type, ids) in wanted {
                let resources = self.source.load(&target_type, &ids).await?;
                push_deduped(resources, &mut seen, &mut included);
            }
        }

        let page_ids: Vec<String> = page_docs
            .iter()
            .filter_map(resource_key)
            .map(|(_, id)| id)
            .collect();
        if !page_ids.is_empty() {
            for directive in rev_includes {
                let resources = self
                    .source
                    .referencing(
                        &directive.referencing_type,
                        &directive.reference_field,
                        &page_ids,
                    )
                    .await?;
                push_deduped(resources, &mut seen, &mut included);
            }
        }

        Ok(included)
    }
}

fn push_deduped(
    resources: Vec<Value>,
    seen: &mut HashSet<(String, String)>,
    included: &mut Vec<Value>,
) {
    for resource in resources {
        match resource_key(&resource) {
            Some(key) => {
                if seen.insert(key) {
                    included.push(resource);
                }
            }
            None => {
                warn!("dropping included resource without type and id");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn _assert_source_object_safe(_: &dyn IncludeSource) {}

    struct FakeSource;

    #[async_trait]
    impl IncludeSource for FakeSource {
        async fn load(&self, target_type: &str, ids: &[String]) -> Result<Vec<Value>> {
            Ok(ids
                .iter()
                .map(|id| json!({"resourceType": target_type, "id": id}))
                .collect())
        }

        async fn referencing(
            &self,
            referencing_type: &str,
            reference_field: &str,
            ids: &[String],
        ) -> Result<Vec<Value>> {
            Ok(ids
                .iter()
                .map(|id| {
                    json!({
                        "resourceType": referencing_type,
                        "id": format!("note-for-{id}"),
                        reference_field: format!("Encounter/{id}"),
                    })
                })
                .collect())
        }
    }

    fn page() -> Vec<Value> {
        vec![
            json!({
                "resourceType": "Encounter",
                "id": "e1",
                "subject": {"reference": "Patient/p1"}
            }),
            json!({
                "resourceType": "Encounter",
                "id": "e2",
                "subject": {"reference": "Patient/p1"}
            }),
        ]
    }

    #[test]
    fn test_parse_directives() {
        let include = IncludeDirective::parse("Encounter:subject:Patient").unwrap();
        assert_eq!(include.target_type.as_deref(), Some("Patient"));
        assert!(IncludeDirective::parse("Encounter").is_err());

        let rev = RevIncludeDirective::parse("Observation:encounter").unwrap();
        assert_eq!(rev.referencing_type, "Observation");
        assert!(RevIncludeDirective::parse("Observation:a:b").is_err());
    }

    #[tokio::test]
    async fn test_forward_include_dedupes_shared_reference() {
        let resolver = IncludeResolver::new(Arc::new(FakeSource));
        let included = resolver
            .resolve(
                &page(),
                &[IncludeDirective::new("Encounter", "subject")],
                &[],
            )
            .await
            .unwrap();
        // Both encounters point at the same patient; it appears once.
        assert_eq!(included.len(), 1);
        assert_eq!(included[0]["id"], "p1");
    }

    #[tokio::test]
    async fn test_forward_include_respects_target_type() {
        let resolver = IncludeResolver::new(Arc::new(FakeSource));
        let included = resolver
            .resolve(
                &page(),
                &[IncludeDirective::new("Encounter", "subject").targeting("Practitioner")],
                &[],
            )
            .await
            .unwrap();
        assert!(included.is_empty());
    }

    #[tokio::test]
    async fn test_reverse_include_queries_page_ids() {
        let resolver = IncludeResolver::new(Arc::new(FakeSource));
        let included = resolver
            .resolve(
                &page(),
                &[],
                &[RevIncludeDirective::new("Observation", "encounter")],
            )
            .await
            .unwrap();
        assert_eq!(included.len(), 2);
        assert_eq!(included[0]["id"], "note-for-e1");
    }

    #[tokio::test]
    async fn test_included_never_duplicates_page_items() {
        struct EchoSource;

        #[async_trait]
        impl IncludeSource for EchoSource {
            async fn load(&self, target_type: &str, ids: &[String]) -> Result<Vec<Value>> {
                Ok(ids
                    .iter()
                    .map(|id| json!({"resourceType": target_type, "id": id}))
                    .collect())
            }

            async fn referencing(
                &self,
                _referencing_type: &str,
                _reference_field: &str,
                _ids: &[String],
            ) -> Result<Vec<Value>> {
                // Returns one of the page items itself.
                Ok(vec![json!({"resourceType": "Encounter", "id": "e1"})])
            }
        }

        let resolver = IncludeResolver::new(Arc::new(EchoSource));
        let included = resolver
            .resolve(
                &page(),
                &[],
                &[RevIncludeDirective::new("Encounter", "partOf")],
            )
            .await
            .unwrap();
        assert!(included.is_empty());
    }
}
