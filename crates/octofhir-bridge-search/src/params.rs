//! Typed search parameter map.
//!
//! A [`SearchParameterMap`] collects the criteria of one search: for each
//! parameter name a list of OR-groups that are ANDed together, plus sort,
//! include and paging directives. Parameter names double as the
//! serialized field paths the criteria are evaluated against.

use indexmap::IndexMap;
use octofhir_bridge_store::SortOrder;

use crate::include::{IncludeDirective, RevIncludeDirective};
use crate::types::date::DateParam;
use crate::types::quantity::QuantityParam;
use crate::types::reference::ReferenceParam;
use crate::types::string::StringParam;
use crate::types::token::TokenParam;

/// Criteria and directives for a single search.
///
/// Repeating a parameter name adds another AND-ed group:
///
/// ```
/// use octofhir_bridge_search::{SearchParameterMap, TokenParam};
///
/// let map = SearchParameterMap::new()
///     .with_token("status", TokenParam::parse("planned,arrived"))
///     .with_token("status", TokenParam::parse("arrived"));
/// assert_eq!(map.tokens().count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchParameterMap {
    references: IndexMap<String, Vec<ReferenceParam>>,
    tokens: IndexMap<String, Vec<TokenParam>>,
    dates: IndexMap<String, Vec<DateParam>>,
    quantities: IndexMap<String, Vec<QuantityParam>>,
    strings: IndexMap<String, Vec<StringParam>>,
    sort: Option<SortOrder>,
    includes: Vec<IncludeDirective>,
    rev_includes: Vec<RevIncludeDirective>,
    everything: Option<String>,
}

impl SearchParameterMap {
    /// Creates an empty map matching everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ANDs a reference OR-group onto `name`.
    #[must_use]
    pub fn with_reference(mut self, name: impl Into<String>, group: ReferenceParam) -> Self {
        self.references.entry(name.into()).or_default().push(group);
        self
    }

    /// ANDs a token OR-group onto `name`.
    #[must_use]
    pub fn with_token(mut self, name: impl Into<String>, group: TokenParam) -> Self {
        self.tokens.entry(name.into()).or_default().push(group);
        self
    }

    /// ANDs a date OR-group onto `name`.
    #[must_use]
    pub fn with_date(mut self, name: impl Into<String>, group: DateParam) -> Self {
        self.dates.entry(name.into()).or_default().push(group);
        self
    }

    /// ANDs a quantity OR-group onto `name`.
    #[must_use]
    pub fn with_quantity(mut self, name: impl Into<String>, group: QuantityParam) -> Self {
        self.quantities.entry(name.into()).or_default().push(group);
        self
    }

    /// ANDs a string OR-group onto `name`.
    #[must_use]
    pub fn with_string(mut self, name: impl Into<String>, group: StringParam) -> Self {
        self.strings.entry(name.into()).or_default().push(group);
        self
    }

    /// Sets the sort order, replacing any previous one.
    #[must_use]
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Adds a forward include directive.
    #[must_use]
    pub fn with_include(mut self, include: IncludeDirective) -> Self {
        self.includes.push(include);
        self
    }

    /// Adds a reverse include directive.
    #[must_use]
    pub fn with_rev_include(mut self, rev_include: RevIncludeDirective) -> Self {
        self.rev_includes.push(rev_include);
        self
    }

    /// Pins the result set to explicit identifiers, overriding all other
    /// criteria. Pass a comma-separated list.
    #[must_use]
    pub fn with_everything(mut self, ids: impl Into<String>) -> Self {
        self.everything = Some(ids.into());
        self
    }

    /// Reference criteria as `(name, AND-ed groups)` pairs.
    pub fn references(&self) -> impl Iterator<Item = (&str, &[ReferenceParam])> {
        self.references.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Token criteria as `(name, AND-ed groups)` pairs.
    pub fn tokens(&self) -> impl Iterator<Item = (&str, &[TokenParam])> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Date criteria as `(name, AND-ed groups)` pairs.
    pub fn dates(&self) -> impl Iterator<Item = (&str, &[DateParam])> {
        self.dates.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Quantity criteria as `(name, AND-ed groups)` pairs.
    pub fn quantities(&self) -> impl Iterator<Item = (&str, &[QuantityParam])> {
        self.quantities.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// String criteria as `(name, AND-ed groups)` pairs.
    pub fn strings(&self) -> impl Iterator<Item = (&str, &[StringParam])> {
        self.strings.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// The requested sort order, if any.
    pub fn sort(&self) -> Option<&SortOrder> {
        self.sort.as_ref()
    }

    /// Forward include directives in insertion order.
    pub fn includes(&self) -> &[IncludeDirective] {
        &self.includes
    }

    /// Reverse include directives in insertion order.
    pub fn rev_includes(&self) -> &[RevIncludeDirective] {
        &self.rev_includes
    }

    /// The raw identifier list set by [`with_everything`](Self::with_everything).
    pub fn everything(&self) -> Option<&str> {
        self.everything.as_deref()
    }

    /// True when no criterion or directive has been set.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
            && self.tokens.is_empty()
            && self.dates.is_empty()
            && self.quantities.is_empty()
            && self.strings.is_empty()
            && self.sort.is_none()
            && self.includes.is_empty()
            && self.rev_includes.is_empty()
            && self.everything.is_none()
    }

    /// True when any reference group carries a chained value.
    pub fn has_chains(&self) -> bool {
        self.references
            .values()
            .flatten()
            .any(ReferenceParam::has_chains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::reference::ReferenceValue;

    #[test]
    fn test_repeated_name_extends_and_list() {
        let map = SearchParameterMap::new()
            .with_token("status", TokenParam::parse("planned,arrived"))
            .with_token("status", TokenParam::parse("arrived"));

        let (name, groups) = map.tokens().next().unwrap();
        assert_eq!(name, "status");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].values().len(), 2);
    }

    #[test]
    fn test_kinds_are_kept_apart() {
        let map = SearchParameterMap::new()
            .with_string("name", StringParam::parse("smith"))
            .with_date("date", DateParam::parse("2024-01-15").unwrap());

        assert_eq!(map.strings().count(), 1);
        assert_eq!(map.dates().count(), 1);
        assert_eq!(map.tokens().count(), 0);
        assert!(!map.is_empty());
    }

    #[test]
    fn test_empty_map() {
        let map = SearchParameterMap::new();
        assert!(map.is_empty());
        assert!(map.sort().is_none());
        assert!(map.everything().is_none());
    }

    #[test]
    fn test_has_chains() {
        let plain = SearchParameterMap::new().with_reference(
            "patient",
            ReferenceParam::new(vec![ReferenceValue::id("p1")]),
        );
        assert!(!plain.has_chains());

        let chained = SearchParameterMap::new().with_reference(
            "patient",
            ReferenceParam::new(vec![ReferenceValue::chained("Patient", "name", "smith")]),
        );
        assert!(chained.has_chains());
    }
}
