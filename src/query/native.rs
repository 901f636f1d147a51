//! Native query and sort algebra understood by search engines.
//!
//! This is the target of translation: match-all, exact term, numeric range,
//! and intersection, plus an ordered list of sort keys.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::field::{FieldValue, SemanticType};

/// A numeric bound value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericValue {
    /// Integer bound.
    Long(i64),
    /// Single precision bound.
    Float(f32),
    /// Double precision bound.
    Double(f64),
}

impl NumericValue {
    /// The semantic type of this bound.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            NumericValue::Long(_) => SemanticType::Long,
            NumericValue::Float(_) => SemanticType::Float,
            NumericValue::Double(_) => SemanticType::Double,
        }
    }

    /// Compare a stored value against this bound.
    ///
    /// Integers compare exactly; everything else is widened to f64.
    /// Strings and NaN are incomparable.
    pub fn compare(&self, value: &FieldValue) -> Option<Ordering> {
        match (value, self) {
            (FieldValue::Long(v), NumericValue::Long(bound)) => Some(v.cmp(bound)),
            (FieldValue::String(_), _) => None,
            _ => value.as_f64()?.partial_cmp(&self.as_f64()),
        }
    }

    /// Widen to f64.
    pub fn as_f64(&self) -> f64 {
        match self {
            NumericValue::Long(v) => *v as f64,
            NumericValue::Float(v) => *v as f64,
            NumericValue::Double(v) => *v,
        }
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Long(v) => write!(f, "{v}"),
            NumericValue::Float(v) => write!(f, "{v}"),
            NumericValue::Double(v) => write!(f, "{v}"),
        }
    }
}

/// A numeric range over one field. Either bound may be open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    /// The field to test.
    pub field: String,
    /// Semantic type of the field.
    pub kind: SemanticType,
    /// Lower bound, if any.
    pub min: Option<NumericValue>,
    /// Upper bound, if any.
    pub max: Option<NumericValue>,
    /// Whether the lower bound itself matches.
    pub min_inclusive: bool,
    /// Whether the upper bound itself matches.
    pub max_inclusive: bool,
}

impl NumericRange {
    /// Check if a value falls within the range.
    pub fn contains(&self, value: &FieldValue) -> bool {
        let lower = match &self.min {
            Some(min) => match min.compare(value) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => self.min_inclusive,
                _ => false,
            },
            None => value.as_f64().is_some(),
        };
        let upper = match &self.max {
            Some(max) => match max.compare(value) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => self.max_inclusive,
                _ => false,
            },
            None => value.as_f64().is_some(),
        };
        lower && upper
    }
}

/// A query in the engine's native algebra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeQuery {
    /// Matches every document.
    MatchAll,
    /// Exact, already-normalized term equality.
    Term {
        /// The field to search in.
        field: String,
        /// The term to match verbatim.
        term: String,
    },
    /// Numeric range.
    NumericRange(NumericRange),
    /// Documents matching every clause.
    Intersection(Vec<NativeQuery>),
}

impl NativeQuery {
    /// Create a term query.
    pub fn term<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        NativeQuery::Term {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Whether this is the neutral match-all query.
    pub fn is_match_all(&self) -> bool {
        matches!(self, NativeQuery::MatchAll)
    }

    /// Intersect two queries. Match-all operands are dropped and nested
    /// intersections flattened.
    pub fn intersect(self, other: NativeQuery) -> NativeQuery {
        let mut clauses = Vec::new();
        for query in [self, other] {
            match query {
                NativeQuery::MatchAll => {}
                NativeQuery::Intersection(inner) => clauses.extend(inner),
                query => clauses.push(query),
            }
        }
        match clauses.len() {
            0 => NativeQuery::MatchAll,
            1 => clauses.remove(0),
            _ => NativeQuery::Intersection(clauses),
        }
    }
}

impl Default for NativeQuery {
    fn default() -> Self {
        NativeQuery::MatchAll
    }
}

impl fmt::Display for NativeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeQuery::MatchAll => f.write_str("*:*"),
            NativeQuery::Term { field, term } => write!(f, "{field}:\"{term}\""),
            NativeQuery::NumericRange(range) => {
                write!(f, "{}:{}", range.field, if range.min_inclusive { '[' } else { '{' })?;
                match &range.min {
                    Some(min) => write!(f, "{min}")?,
                    None => f.write_str("*")?,
                }
                f.write_str(" TO ")?;
                match &range.max {
                    Some(max) => write!(f, "{max}")?,
                    None => f.write_str("*")?,
                }
                write!(f, "{}", if range.max_inclusive { ']' } else { '}' })
            }
            NativeQuery::Intersection(clauses) => {
                let parts: Vec<String> = clauses.iter().map(|c| format!("+{c}")).collect();
                write!(f, "({})", parts.join(" "))
            }
        }
    }
}

/// One key of a multi-key sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Field to sort by.
    pub field: String,
    /// Comparator family.
    pub kind: SemanticType,
    /// Descending order.
    pub descending: bool,
}

/// Ordered list of sort keys. Empty means natural (engine) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// The natural order.
    pub fn natural() -> Self {
        SortSpec { keys: Vec::new() }
    }

    /// A spec with one primary key.
    pub fn by(key: SortKey) -> Self {
        SortSpec { keys: vec![key] }
    }

    /// Whether this is the natural order.
    pub fn is_natural(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append a lower-priority key.
    pub fn push(&mut self, key: SortKey) {
        self.keys.push(key);
    }

    /// The keys, highest priority first.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_natural() {
            return f.write_str("<natural>");
        }
        let parts: Vec<String> = self
            .keys
            .iter()
            .map(|k| format!("{}({}){}", k.field, k.kind, if k.descending { " desc" } else { "" }))
            .collect();
        f.write_str(&parts.join(", "))
    }
}
