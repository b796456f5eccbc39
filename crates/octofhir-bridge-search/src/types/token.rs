//! Token (coded value) search parameters.

use octofhir_bridge_store::{Clause, Condition};

/// A single token alternative in `system|code` notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValue {
    /// The code system. `None` matches any system; `Some("")` (written
    /// `|code`) matches only entries without a system.
    pub system: Option<String>,
    /// The code itself.
    pub code: String,
}

impl TokenValue {
    /// Creates a token matching the code under any system.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            system: None,
            code: code.into(),
        }
    }

    /// Creates a token bound to a specific system.
    pub fn with_system(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: code.into(),
        }
    }

    /// Parses `system|code` notation: `sys|code`, `|code` (explicit empty
    /// system), or a bare `code`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('|') {
            Some((system, code)) => Self {
                system: Some(system.to_string()),
                code: code.to_string(),
            },
            None => Self::new(raw),
        }
    }
}

/// One OR-group of token alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenParam {
    values: Vec<TokenValue>,
}

impl TokenParam {
    /// Creates a group from explicit alternatives.
    #[must_use]
    pub fn new(values: Vec<TokenValue>) -> Self {
        Self { values }
    }

    /// Parses a comma-separated OR list of `system|code` values.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(TokenValue::parse)
            .collect();
        Self { values }
    }

    /// The OR alternatives.
    #[must_use]
    pub fn values(&self) -> &[TokenValue] {
        &self.values
    }

    /// Whether the group carries no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn to_clause(field: &str, group: &TokenParam) -> Option<Clause> {
    let alternatives = group
        .values
        .iter()
        .map(|value| Condition::Token {
            field: field.to_string(),
            system: value.system.clone(),
            code: value.code.clone(),
        })
        .collect();
    Clause::any(alternatives)
}
