//! Reference parsing and extraction utilities.
//!
//! References between entities appear in two local forms:
//! - Relative: `Visit/123`
//! - Bare identifier: `123` (the field's schema fixes the target type)
//!
//! Contained (`#id`), URN (`urn:uuid:...`), and absolute-URL forms cannot be
//! resolved by a domain store and are rejected at the parsing seam.

use std::fmt;

use serde_json::Value;

/// A successfully parsed local reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityReference {
    /// The target type, when the reference carried one.
    pub target_type: Option<String>,
    /// The referenced identifier.
    pub id: String,
}

impl EntityReference {
    /// Creates an untyped reference from a bare identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            target_type: None,
            id: id.into(),
        }
    }

    /// Creates a typed reference.
    pub fn typed(target_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            target_type: Some(target_type.into()),
            id: id.into(),
        }
    }

    /// Returns the reference as a relative string (`Type/id`, or the bare
    /// identifier when no type is known).
    #[must_use]
    pub fn to_relative(&self) -> String {
        match &self.target_type {
            Some(t) => format!("{}/{}", t, self.id),
            None => self.id.clone(),
        }
    }

    /// Whether this reference could point at an entity of `target_type`.
    /// An untyped reference matches any type.
    #[must_use]
    pub fn could_target(&self, target_type: &str) -> bool {
        match &self.target_type {
            Some(t) => t == target_type,
            None => true,
        }
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_relative())
    }
}

/// A reference that cannot be resolved against a local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvableReference {
    /// A contained reference (starts with `#`).
    Contained(String),
    /// A URN reference (`urn:uuid:xxx` or `urn:oid:xxx`).
    Urn(String),
    /// An absolute URL pointing at another server.
    Absolute(String),
    /// An empty or malformed reference.
    Invalid(String),
}

impl fmt::Display for UnresolvableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contained(id) => write!(f, "contained reference: #{id}"),
            Self::Urn(urn) => write!(f, "URN reference: {urn}"),
            Self::Absolute(url) => write!(f, "absolute reference: {url}"),
            Self::Invalid(reason) => write!(f, "invalid reference: {reason}"),
        }
    }
}

impl std::error::Error for UnresolvableReference {}

/// Parses a reference string into its components.
///
/// Accepts `Type/id` and bare-identifier forms. Everything a domain store
/// cannot resolve locally is returned as [`UnresolvableReference`].
pub fn parse_reference(reference: &str) -> Result<EntityReference, UnresolvableReference> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UnresolvableReference::Invalid("empty string".to_string()));
    }
    if let Some(contained) = reference.strip_prefix('#') {
        return Err(UnresolvableReference::Contained(contained.to_string()));
    }
    if reference.starts_with("urn:") {
        return Err(UnresolvableReference::Urn(reference.to_string()));
    }
    if reference.contains("://") {
        return Err(UnresolvableReference::Absolute(reference.to_string()));
    }

    match reference.split_once('/') {
        Some((target_type, id)) => {
            if target_type.is_empty() || id.is_empty() || id.contains('/') {
                Err(UnresolvableReference::Invalid(reference.to_string()))
            } else {
                Ok(EntityReference::typed(target_type, id))
            }
        }
        None => Ok(EntityReference::new(reference)),
    }
}

/// Returns every value reachable at a dot-separated `path` within a JSON
/// document. Arrays are flattened at each step, so `participant.individual`
/// visits every participant.
#[must_use]
pub fn values_at<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current: Vec<&Value> = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(v) = map.get(segment) {
                        next.push(v);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = item.get(segment) {
                            next.push(v);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
}

/// Extracts all parseable references found at a dot-separated `path` within
/// a JSON document.
///
/// At the final position the value may be a reference string, an object
/// with a `reference` field, or an array of either. Unresolvable forms are
/// skipped.
#[must_use]
pub fn extract_references(doc: &Value, path: &str) -> Vec<EntityReference> {
    let mut references = Vec::new();
    for value in values_at(doc, path) {
        collect_reference_values(value, &mut references);
    }
    references
}

fn collect_reference_values(value: &Value, out: &mut Vec<EntityReference>) {
    match value {
        Value::String(s) => {
            if let Ok(reference) = parse_reference(s) {
                out.push(reference);
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("reference")
                && let Ok(reference) = parse_reference(s)
            {
                out.push(reference);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_reference_values(item, out);
            }
        }
        _ => {}
    }
}
