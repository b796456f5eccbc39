//! Store-level predicate model and its in-memory evaluation.
//!
//! A [`Predicate`] is a conjunction of [`Clause`]s; a clause is a
//! disjunction of [`Condition`]s. Search compilation produces one clause
//! per parameter submission, so repeated parameters AND together while the
//! alternatives inside one submission OR together.
//!
//! Conditions evaluate against the serialized JSON form of an entity,
//! which lets the in-memory store execute any predicate without
//! per-entity-type code. SQL-backed stores would translate the same model
//! into their own dialect instead of calling [`Condition::matches`].

use octofhir_bridge_core::EntityReference;
use octofhir_bridge_core::reference::values_at;
use octofhir_bridge_core::time::parse_instant;
use serde_json::Value;
use time::OffsetDateTime;

/// How a text condition compares its value against field content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringComparison {
    /// Field starts with the value (the default).
    #[default]
    StartsWith,
    /// Field equals the value.
    Exact,
    /// Field contains the value anywhere.
    Contains,
}

/// A single testable condition over an entity document.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The entity identifier is in the given set.
    IdIn(Vec<String>),

    /// A reference field points at any of the given targets.
    /// An empty target set matches nothing.
    Reference {
        /// Dot-separated field path.
        field: String,
        /// Acceptable reference targets.
        targets: Vec<EntityReference>,
    },

    /// A coded field matches `system`/`code`.
    ///
    /// With `system: None` any system matches; with `system: Some("")`
    /// only entries carrying no system match.
    Token {
        /// Dot-separated field path.
        field: String,
        /// Required code system.
        system: Option<String>,
        /// Required code.
        code: String,
    },

    /// A temporal field falls in the half-open interval `[start, end)`.
    /// Either bound may be absent.
    DateRange {
        /// Dot-separated field path.
        field: String,
        /// Inclusive lower bound.
        start: Option<OffsetDateTime>,
        /// Exclusive upper bound.
        end: Option<OffsetDateTime>,
    },

    /// A numeric field falls within the given bounds, optionally carrying
    /// a matching unit.
    ///
    /// When a unit is required, values without unit information do not
    /// match.
    Number {
        /// Dot-separated field path.
        field: String,
        /// Lower bound.
        min: Option<f64>,
        /// Whether the lower bound is exclusive.
        min_exclusive: bool,
        /// Upper bound.
        max: Option<f64>,
        /// Whether the upper bound is exclusive.
        max_exclusive: bool,
        /// Required unit.
        unit: Option<String>,
    },

    /// A text field matches the value case-insensitively.
    Text {
        /// Dot-separated field path.
        field: String,
        /// Value to compare.
        value: String,
        /// Comparison mode.
        comparison: StringComparison,
    },
}

impl Condition {
    /// Evaluates the condition against an entity document.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::IdIn(ids) => doc
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| ids.iter().any(|candidate| candidate == id)),

            Self::Reference { field, targets } => {
                octofhir_bridge_core::extract_references(doc, field)
                    .iter()
                    .any(|found| targets.iter().any(|target| reference_matches(found, target)))
            }

            Self::Token {
                field,
                system,
                code,
            } => values_at(doc, field).iter().any(|value| {
                token_candidates(value)
                    .iter()
                    .any(|(candidate_system, candidate_code)| {
                        candidate_code == code
                            && match system.as_deref() {
                                None => true,
                                Some("") => candidate_system.is_none(),
                                Some(required) => candidate_system.as_deref() == Some(required),
                            }
                    })
            }),

            Self::DateRange { field, start, end } => {
                values_at(doc, field).iter().any(|value| {
                    let Some(raw) = value.as_str() else {
                        return false;
                    };
                    let Ok(instant) = parse_instant(raw) else {
                        return false;
                    };
                    start.is_none_or(|lower| instant >= lower)
                        && end.is_none_or(|upper| instant < upper)
                })
            }

            Self::Number {
                field,
                min,
                min_exclusive,
                max,
                max_exclusive,
                unit,
            } => values_at(doc, field).iter().any(|value| {
                number_candidates(value).iter().any(|(number, candidate_unit)| {
                    let lower_ok = match min {
                        None => true,
                        Some(bound) if *min_exclusive => number > bound,
                        Some(bound) => number >= bound,
                    };
                    let upper_ok = match max {
                        None => true,
                        Some(bound) if *max_exclusive => number < bound,
                        Some(bound) => number <= bound,
                    };
                    let unit_ok = match unit {
                        None => true,
                        Some(required) => candidate_unit.as_deref() == Some(required.as_str()),
                    };
                    lower_ok && upper_ok && unit_ok
                })
            }),

            Self::Text {
                field,
                value,
                comparison,
            } => {
                let needle = value.to_lowercase();
                values_at(doc, field).iter().any(|candidate| {
                    text_candidates(candidate).iter().any(|text| {
                        let haystack = text.to_lowercase();
                        match comparison {
                            StringComparison::StartsWith => haystack.starts_with(&needle),
                            StringComparison::Exact => haystack == needle,
                            StringComparison::Contains => haystack.contains(&needle),
                        }
                    })
                })
            }
        }
    }
}

fn reference_matches(found: &EntityReference, target: &EntityReference) -> bool {
    if found.id != target.id {
        return false;
    }
    // A type constraint only binds when both sides carry one.
    match (&found.target_type, &target.target_type) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Collects `(system, code)` candidates from a coded field value.
///
/// Accepts plain code strings, `system|code` strings, coding objects with
/// `system`/`code` members, and arrays of any of these.
fn token_candidates(value: &Value) -> Vec<(Option<String>, String)> {
    let mut out = Vec::new();
    collect_token_candidates(value, &mut out);
    out
}

fn collect_token_candidates(value: &Value, out: &mut Vec<(Option<String>, String)>) {
    match value {
        Value::String(s) => match s.split_once('|') {
            Some((system, code)) => out.push((Some(system.to_string()), code.to_string())),
            None => out.push((None, s.clone())),
        },
        Value::Object(map) => {
            if let Some(code) = map.get("code").and_then(Value::as_str) {
                let system = map
                    .get("system")
                    .and_then(Value::as_str)
                    .map(ToString::to_string);
                out.push((system, code.to_string()));
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_token_candidates(item, out);
            }
        }
        _ => {}
    }
}

/// Collects `(value, unit)` candidates from a numeric field value.
fn number_candidates(value: &Value) -> Vec<(f64, Option<String>)> {
    let mut out = Vec::new();
    collect_number_candidates(value, &mut out);
    out
}

fn collect_number_candidates(value: &Value, out: &mut Vec<(f64, Option<String>)>) {
    match value {
        Value::Number(n) => {
            if let Some(number) = n.as_f64() {
                out.push((number, None));
            }
        }
        Value::String(s) => {
            if let Ok(number) = s.parse::<f64>() {
                out.push((number, None));
            }
        }
        Value::Object(map) => {
            if let Some(number) = map.get("value").and_then(Value::as_f64) {
                let unit = map
                    .get("unit")
                    .or_else(|| map.get("code"))
                    .and_then(Value::as_str)
                    .map(ToString::to_string);
                out.push((number, unit));
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_number_candidates(item, out);
            }
        }
        _ => {}
    }
}

fn text_candidates(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_text_candidates(value, &mut out);
    out
}

fn collect_text_candidates(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                collect_text_candidates(item, out);
            }
        }
        _ => {}
    }
}

/// A disjunction of conditions: the clause matches when any alternative
/// does.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    alternatives: Vec<Condition>,
}

impl Clause {
    /// Creates a clause with a single condition.
    #[must_use]
    pub fn single(condition: Condition) -> Self {
        Self {
            alternatives: vec![condition],
        }
    }

    /// Creates a clause from OR alternatives. Returns `None` for an empty
    /// list: an empty OR-group constrains nothing and must not produce a
    /// clause that matches nothing.
    #[must_use]
    pub fn any(alternatives: Vec<Condition>) -> Option<Self> {
        if alternatives.is_empty() {
            None
        } else {
            Some(Self { alternatives })
        }
    }

    /// The OR alternatives of this clause.
    #[must_use]
    pub fn alternatives(&self) -> &[Condition] {
        &self.alternatives
    }

    /// Evaluates the clause against an entity document.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.alternatives.iter().any(|condition| condition.matches(doc))
    }
}

/// A conjunction of clauses. The empty predicate matches every document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Creates an unconstrained predicate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause, consuming and returning the predicate.
    #[must_use]
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Adds a clause in place.
    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// The conjoined clauses.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether the predicate constrains anything at all.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluates the predicate against an entity document.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| clause.matches(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn visit_doc() -> Value {
        json!({
            "id": "v1",
            "patient": "Patient/p1",
            "visitType": {"system": "http://example.org/visit-type", "code": "inpatient"},
            "started": "2023-06-15T10:30:00Z",
            "location": "Ward A",
            "durationHours": {"value": 36.5, "unit": "h"},
            "voided": false
        })
    }

    #[test]
    fn test_id_in() {
        let condition = Condition::IdIn(vec!["v1".to_string(), "v2".to_string()]);
        assert!(condition.matches(&visit_doc()));
        let condition = Condition::IdIn(vec!["other".to_string()]);
        assert!(!condition.matches(&visit_doc()));
    }

    #[test]
    fn test_reference_by_id_and_type() {
        let doc = visit_doc();
        let matching = Condition::Reference {
            field: "patient".to_string(),
            targets: vec![EntityReference::typed("Patient", "p1")],
        };
        assert!(matching.matches(&doc));

        let untyped = Condition::Reference {
            field: "patient".to_string(),
            targets: vec![EntityReference::new("p1")],
        };
        assert!(untyped.matches(&doc));

        let wrong_type = Condition::Reference {
            field: "patient".to_string(),
            targets: vec![EntityReference::typed("Practitioner", "p1")],
        };
        assert!(!wrong_type.matches(&doc));
    }

    #[test]
    fn test_reference_empty_targets_matches_nothing() {
        let condition = Condition::Reference {
            field: "patient".to_string(),
            targets: Vec::new(),
        };
        assert!(!condition.matches(&visit_doc()));
    }

    #[test]
    fn test_token_system_rules() {
        let doc = visit_doc();
        let any_system = Condition::Token {
            field: "visitType".to_string(),
            system: None,
            code: "inpatient".to_string(),
        };
        assert!(any_system.matches(&doc));

        let exact_system = Condition::Token {
            field: "visitType".to_string(),
            system: Some("http://example.org/visit-type".to_string()),
            code: "inpatient".to_string(),
        };
        assert!(exact_system.matches(&doc));

        let wrong_system = Condition::Token {
            field: "visitType".to_string(),
            system: Some("http://elsewhere".to_string()),
            code: "inpatient".to_string(),
        };
        assert!(!wrong_system.matches(&doc));

        // Explicit empty system only matches entries without one.
        let empty_system = Condition::Token {
            field: "visitType".to_string(),
            system: Some(String::new()),
            code: "inpatient".to_string(),
        };
        assert!(!empty_system.matches(&doc));
        let plain = json!({"visitType": "inpatient"});
        assert!(empty_system.matches(&plain));
    }

    #[test]
    fn test_token_string_forms() {
        let doc = json!({"tag": "http://example.org|urgent"});
        let condition = Condition::Token {
            field: "tag".to_string(),
            system: Some("http://example.org".to_string()),
            code: "urgent".to_string(),
        };
        assert!(condition.matches(&doc));
    }

    #[test]
    fn test_date_range_half_open() {
        let doc = visit_doc();
        let inside = Condition::DateRange {
            field: "started".to_string(),
            start: Some(datetime!(2023-06-15 00:00:00 UTC)),
            end: Some(datetime!(2023-06-16 00:00:00 UTC)),
        };
        assert!(inside.matches(&doc));

        let boundary = Condition::DateRange {
            field: "started".to_string(),
            start: None,
            end: Some(datetime!(2023-06-15 10:30:00 UTC)),
        };
        assert!(!boundary.matches(&doc));

        let unbounded_above = Condition::DateRange {
            field: "started".to_string(),
            start: Some(datetime!(2020-01-01 00:00:00 UTC)),
            end: None,
        };
        assert!(unbounded_above.matches(&doc));
    }

    #[test]
    fn test_number_bounds_and_unit() {
        let doc = visit_doc();
        let in_range = Condition::Number {
            field: "durationHours".to_string(),
            min: Some(36.5),
            min_exclusive: false,
            max: None,
            max_exclusive: false,
            unit: Some("h".to_string()),
        };
        assert!(in_range.matches(&doc));

        let exclusive = Condition::Number {
            field: "durationHours".to_string(),
            min: Some(36.5),
            min_exclusive: true,
            max: None,
            max_exclusive: false,
            unit: None,
        };
        assert!(!exclusive.matches(&doc));

        let wrong_unit = Condition::Number {
            field: "durationHours".to_string(),
            min: Some(1.0),
            min_exclusive: false,
            max: None,
            max_exclusive: false,
            unit: Some("d".to_string()),
        };
        assert!(!wrong_unit.matches(&doc));
    }

    #[test]
    fn test_text_comparisons() {
        let doc = visit_doc();
        let starts = Condition::Text {
            field: "location".to_string(),
            value: "ward".to_string(),
            comparison: StringComparison::StartsWith,
        };
        assert!(starts.matches(&doc));

        let exact = Condition::Text {
            field: "location".to_string(),
            value: "ward a".to_string(),
            comparison: StringComparison::Exact,
        };
        assert!(exact.matches(&doc));

        let contains = Condition::Text {
            field: "location".to_string(),
            value: "rd a".to_string(),
            comparison: StringComparison::Contains,
        };
        assert!(contains.matches(&doc));

        let miss = Condition::Text {
            field: "location".to_string(),
            value: "icu".to_string(),
            comparison: StringComparison::StartsWith,
        };
        assert!(!miss.matches(&doc));
    }

    #[test]
    fn test_clause_or_and_predicate_and() {
        let doc = visit_doc();
        let clause = Clause::any(vec![
            Condition::Text {
                field: "location".to_string(),
                value: "icu".to_string(),
                comparison: StringComparison::Exact,
            },
            Condition::Text {
                field: "location".to_string(),
                value: "ward a".to_string(),
                comparison: StringComparison::Exact,
            },
        ])
        .unwrap();
        assert!(clause.matches(&doc));

        let predicate = Predicate::new()
            .and(clause)
            .and(Clause::single(Condition::IdIn(vec!["v1".to_string()])));
        assert!(predicate.matches(&doc));

        let contradiction = Predicate::new()
            .and(Clause::single(Condition::IdIn(vec!["v1".to_string()])))
            .and(Clause::single(Condition::IdIn(vec!["v2".to_string()])));
        assert!(!contradiction.matches(&doc));
    }

    #[test]
    fn test_empty_or_group_yields_no_clause() {
        assert!(Clause::any(Vec::new()).is_none());
    }

    #[test]
    fn test_unconstrained_predicate_matches_everything() {
        let predicate = Predicate::new();
        assert!(predicate.is_unconstrained());
        assert!(predicate.matches(&visit_doc()));
        assert!(predicate.matches(&json!({})));
    }
}
