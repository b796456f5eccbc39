//! Quantity (number with optional unit) search parameters.

use octofhir_bridge_core::{BridgeError, Result};
use octofhir_bridge_store::{Clause, Condition};

use super::Prefix;

/// A single quantity alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityValue {
    /// Comparison prefix.
    pub prefix: Prefix,
    /// The numeric value.
    pub value: f64,
    /// Required unit, when given.
    pub unit: Option<String>,
}

impl QuantityValue {
    /// Creates a unitless quantity alternative.
    #[must_use]
    pub fn new(prefix: Prefix, value: f64) -> Self {
        Self {
            prefix,
            value,
            unit: None,
        }
    }

    /// Creates a quantity alternative with a unit.
    pub fn with_unit(prefix: Prefix, value: f64, unit: impl Into<String>) -> Self {
        Self {
            prefix,
            value,
            unit: Some(unit.into()),
        }
    }

    /// Parses a prefixed value such as `ge5.4`, `5.4|mg`, or the
    /// three-part `5.4|http://unitsofmeasure.org|mg` form (the code is
    /// taken as the unit).
    pub fn parse(raw: &str) -> Result<Self> {
        let (prefix, rest) = Prefix::split(raw);
        let parts: Vec<&str> = rest.split('|').collect();
        let value: f64 = parts[0]
            .trim()
            .parse()
            .map_err(|_| BridgeError::invalid_request(format!("invalid quantity value '{raw}'")))?;
        let unit = match parts.as_slice() {
            [_] => None,
            [_, unit] | [_, _, unit] => {
                let unit = unit.trim();
                (!unit.is_empty()).then(|| unit.to_string())
            }
            _ => {
                return Err(BridgeError::invalid_request(format!(
                    "invalid quantity value '{raw}'"
                )));
            }
        };
        Ok(Self {
            prefix,
            value,
            unit,
        })
    }

    fn to_condition(&self, field: &str) -> Condition {
        let (min, min_exclusive, max, max_exclusive) = match self.prefix {
            Prefix::Eq => (Some(self.value), false, Some(self.value), false),
            Prefix::Ge => (Some(self.value), false, None, false),
            Prefix::Gt => (Some(self.value), true, None, false),
            Prefix::Le => (None, false, Some(self.value), false),
            Prefix::Lt => (None, false, Some(self.value), true),
        };
        Condition::Number {
            field: field.to_string(),
            min,
            min_exclusive,
            max,
            max_exclusive,
            unit: self.unit.clone(),
        }
    }
}

/// One OR-group of quantity alternatives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuantityParam {
    values: Vec<QuantityValue>,
}

impl QuantityParam {
    /// Creates a group from explicit alternatives.
    #[must_use]
    pub fn new(values: Vec<QuantityValue>) -> Self {
        Self { values }
    }

    /// Parses a comma-separated OR list of prefixed quantity values.
    pub fn parse(raw: &str) -> Result<Self> {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(QuantityValue::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }

    /// The OR alternatives.
    #[must_use]
    pub fn values(&self) -> &[QuantityValue] {
        &self.values
    }

    /// Whether the group carries no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn to_clause(field: &str, group: &QuantityParam) -> Option<Clause> {
    let alternatives = group
        .values
        .iter()
        .map(|value| value.to_condition(field))
        .collect();
    Clause::any(alternatives)
}
