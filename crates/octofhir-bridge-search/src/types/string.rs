//! String search parameters.

use octofhir_bridge_store::{Clause, Condition, StringComparison};

/// One OR-group of string alternatives sharing a comparison mode.
///
/// The default mode is starts-with; `exact` and `contains` tighten or
/// loosen it for the whole group. Matching is case-insensitive in every
/// mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringParam {
    values: Vec<String>,
    comparison: StringComparison,
}

impl StringParam {
    /// Creates a starts-with group from explicit alternatives.
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            comparison: StringComparison::StartsWith,
        }
    }

    /// Parses a comma-separated OR list.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
            .collect();
        Self {
            values,
            comparison: StringComparison::StartsWith,
        }
    }

    /// Switches the group to exact matching.
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.comparison = StringComparison::Exact;
        self
    }

    /// Switches the group to contains matching.
    #[must_use]
    pub fn contains(mut self) -> Self {
        self.comparison = StringComparison::Contains;
        self
    }

    /// The OR alternatives.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The comparison mode applied to every alternative.
    #[must_use]
    pub fn comparison(&self) -> StringComparison {
        self.comparison
    }

    /// Whether the group carries no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn to_clause(field: &str, group: &StringParam) -> Option<Clause> {
    let alternatives = group
        .values
        .iter()
        .map(|value| Condition::Text {
            field: field.to_string(),
            value: value.clone(),
            comparison: group.comparison,
        })
        .collect();
    Clause::any(alternatives)
}
