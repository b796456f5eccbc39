//! Date search parameters, truncated to day precision.

use octofhir_bridge_core::time::{day_of, day_start, next_day_start, parse_date, parse_instant};
use octofhir_bridge_core::{BridgeError, Result};
use octofhir_bridge_store::{Clause, Condition};
use time::Date;

use super::Prefix;

/// A single date alternative: a comparison prefix and a calendar day.
///
/// Datetime inputs are accepted but truncated to their UTC day, so every
/// comparison works on day bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    /// Comparison prefix.
    pub prefix: Prefix,
    /// The (truncated) day.
    pub date: Date,
}

impl DateValue {
    /// Creates a date alternative.
    #[must_use]
    pub fn new(prefix: Prefix, date: Date) -> Self {
        Self { prefix, date }
    }

    /// Parses a prefixed value such as `ge2023-06-15` or
    /// `lt2023-06-15T10:30:00Z`. Values below day precision (bare years or
    /// months) are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let (prefix, rest) = Prefix::split(raw);
        let date = if rest.contains('T') {
            day_of(parse_instant(rest)?)
        } else {
            parse_date(rest).map_err(|_| {
                BridgeError::invalid_request(format!(
                    "invalid date value '{rest}': expected YYYY-MM-DD or a full datetime"
                ))
            })?
        };
        Ok(Self { prefix, date })
    }

    fn to_condition(self, field: &str) -> Result<Condition> {
        let (start, end) = match self.prefix {
            Prefix::Eq => (Some(day_start(self.date)), Some(next_day_start(self.date)?)),
            Prefix::Ge => (Some(day_start(self.date)), None),
            Prefix::Gt => (Some(next_day_start(self.date)?), None),
            Prefix::Le => (None, Some(next_day_start(self.date)?)),
            Prefix::Lt => (None, Some(day_start(self.date))),
        };
        Ok(Condition::DateRange {
            field: field.to_string(),
            start,
            end,
        })
    }
}

/// One OR-group of date alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateParam {
    values: Vec<DateValue>,
}

impl DateParam {
    /// Creates a group from explicit alternatives.
    #[must_use]
    pub fn new(values: Vec<DateValue>) -> Self {
        Self { values }
    }

    /// Parses a comma-separated OR list of prefixed date values.
    pub fn parse(raw: &str) -> Result<Self> {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(DateValue::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }

    /// The OR alternatives.
    #[must_use]
    pub fn values(&self) -> &[DateValue] {
        &self.values
    }

    /// Whether the group carries no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn to_clause(field: &str, group: &DateParam) -> Result<Option<Clause>> {
    let mut alternatives = Vec::with_capacity(group.values.len());
    for value in &group.values {
        alternatives.push(value.to_condition(field)?);
    }
    Ok(Clause::any(alternatives))
}
