//! Sort order applied when fetching a result window.

use std::cmp::Ordering;

use octofhir_bridge_core::reference::values_at;
use serde_json::Value;

/// A sort directive over a single entity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    /// Dot-separated field path to sort by.
    pub field: String,
    /// Whether to sort descending.
    pub descending: bool,
}

impl SortOrder {
    /// Creates an ascending sort order.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Creates a descending sort order.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parses the `field` / `-field` notation.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(raw),
        }
    }

    /// Compares two entity documents under this order.
    ///
    /// Documents missing the field sort last regardless of direction.
    #[must_use]
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let left = values_at(a, &self.field).into_iter().next();
        let right = values_at(b, &self.field).into_iter().next();
        match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => {
                let ordering = compare_values(left, right);
                if self.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        // Mixed kinds have no meaningful order; keep them stable.
        _ => Ordering::Equal,
    }
}
