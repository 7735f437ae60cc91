//! Attribute filter rules for symbology.
//!
//! A rule selects which features a symbol applies to. The expression
//! grammar (`[CNTR_CODE] = 'IT'`, `[pop] > 100000 and [area] < 50`, ...)
//! belongs to the tile service's renderer and is passed through verbatim;
//! nothing is evaluated locally.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A feature-selection rule attached to a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Rule {
    /// Applies to every feature of the layer.
    All,
    /// Applies to the features matching a filter expression.
    Filter(String),
}

impl Rule {
    /// Parses the wire form: the literal `"all"` or a filter expression.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::EmptyRule);
        }
        if s.eq_ignore_ascii_case("all") {
            Ok(Rule::All)
        } else {
            Ok(Rule::Filter(s.to_string()))
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::All => f.write_str("all"),
            Rule::Filter(expr) => f.write_str(expr),
        }
    }
}

impl From<Rule> for String {
    fn from(rule: Rule) -> Self {
        rule.to_string()
    }
}

impl TryFrom<String> for Rule {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Rule::parse(&s)
    }
}
