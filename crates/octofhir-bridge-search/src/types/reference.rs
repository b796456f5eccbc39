//! Reference search parameters, with optional single-link chaining.

use octofhir_bridge_core::{BridgeError, EntityReference, Result, parse_reference};

/// A single reference alternative.
///
/// Without a chain, `value` is the referenced identifier. With a chain,
/// `value` is the criterion applied to the `chain` parameter of the
/// referenced type (`subject.name=smith` puts `name` in `chain` and
/// `smith` in `value`), and `target_type` is required so the chain can be
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceValue {
    /// Restricts which entity type the reference may point at.
    pub target_type: Option<String>,
    /// Chained parameter on the referenced type.
    pub chain: Option<String>,
    /// Referenced identifier, or the chained criterion value.
    pub value: String,
}

impl ReferenceValue {
    /// Creates an untyped reference to an identifier.
    pub fn id(value: impl Into<String>) -> Self {
        Self {
            target_type: None,
            chain: None,
            value: value.into(),
        }
    }

    /// Creates a type-restricted reference to an identifier.
    pub fn typed(target_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target_type: Some(target_type.into()),
            chain: None,
            value: value.into(),
        }
    }

    /// Creates a chained criterion against a parameter of the target type.
    pub fn chained(
        target_type: impl Into<String>,
        chain: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            target_type: Some(target_type.into()),
            chain: Some(chain.into()),
            value: value.into(),
        }
    }

    /// Parses a direct reference value: `Type/id` or a bare identifier.
    /// Contained, URN, and absolute-URL forms are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let reference = parse_reference(raw).map_err(|unresolvable| {
            BridgeError::invalid_request(format!("unsupported reference value: {unresolvable}"))
        })?;
        Ok(Self {
            target_type: reference.target_type,
            chain: None,
            value: reference.id,
        })
    }

    /// Whether this alternative is chained.
    #[must_use]
    pub fn has_chain(&self) -> bool {
        self.chain.is_some()
    }

    pub(crate) fn to_target(&self) -> EntityReference {
        EntityReference {
            target_type: self.target_type.clone(),
            id: self.value.clone(),
        }
    }
}

/// One OR-group of reference alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceParam {
    values: Vec<ReferenceValue>,
}

impl ReferenceParam {
    /// Creates a group from explicit alternatives.
    #[must_use]
    pub fn new(values: Vec<ReferenceValue>) -> Self {
        Self { values }
    }

    /// Parses a comma-separated OR list of direct reference values.
    pub fn parse(raw: &str) -> Result<Self> {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ReferenceValue::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }

    /// The OR alternatives.
    #[must_use]
    pub fn values(&self) -> &[ReferenceValue] {
        &self.values
    }

    /// Whether the group carries no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether any alternative is chained.
    #[must_use]
    pub fn has_chains(&self) -> bool {
        self.values.iter().any(ReferenceValue::has_chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_and_bare() {
        assert_eq!(
            ReferenceValue::parse("Patient/p1").unwrap(),
            ReferenceValue::typed("Patient", "p1")
        );
        assert_eq!(
            ReferenceValue::parse("p1").unwrap(),
            ReferenceValue::id("p1")
        );
    }

    #[test]
    fn test_parse_rejects_unresolvable() {
        assert!(ReferenceValue::parse("#contained").is_err());
        assert!(ReferenceValue::parse("urn:uuid:123").is_err());
        assert!(ReferenceValue::parse("https://example.org/Patient/1").is_err());
    }

    #[test]
    fn test_group_parse_and_chains() {
        let group = ReferenceParam::parse("Patient/p1,p2").unwrap();
        assert_eq!(group.values().len(), 2);
        assert!(!group.has_chains());

        let chained = ReferenceParam::new(vec![ReferenceValue::chained(
            "Patient", "name", "smith",
        )]);
        assert!(chained.has_chains());
    }

    #[test]
    fn test_to_target() {
        let target = ReferenceValue::typed("Patient", "p1").to_target();
        assert_eq!(target, EntityReference::typed("Patient", "p1"));
    }
}
