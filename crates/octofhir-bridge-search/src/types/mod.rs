//! Typed search parameter values, one module per parameter kind.

pub mod date;
pub mod quantity;
pub mod reference;
pub mod string;
pub mod token;

use std::fmt;

/// Comparison prefix accepted on date and quantity values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prefix {
    /// Equal (within the truncated unit for dates). The default.
    #[default]
    Eq,
    /// Greater than or equal.
    Ge,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Le,
    /// Less than.
    Lt,
}

impl Prefix {
    /// Parses a two-character prefix code.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "eq" => Some(Self::Eq),
            "ge" => Some(Self::Ge),
            "gt" => Some(Self::Gt),
            "le" => Some(Self::Le),
            "lt" => Some(Self::Lt),
            _ => None,
        }
    }

    /// Splits a raw value into its prefix and remainder; values without a
    /// recognized prefix default to `Eq`.
    #[must_use]
    pub fn split(raw: &str) -> (Self, &str) {
        if raw.len() >= 2
            && let Some(prefix) = Self::parse(&raw[..2])
        {
            return (prefix, &raw[2..]);
        }
        (Self::Eq, raw)
    }

    /// The two-character prefix code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ge => "ge",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Lt => "lt",
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
