//! Field value types and field options for documents.
//!
//! This module defines:
//! - [`Field`] - A named value together with its indexing options
//! - [`FieldValue`] - The value stored in a field (Long, Float, Double, String)
//! - [`FieldOption`] - How the engine should treat the value
//! - [`SemanticType`] - The comparison family of a value
//!
//! Booleans, date-times and durations have no dedicated variant: they are
//! encoded as [`FieldValue::Long`] (0/1 and tick counts respectively).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The comparison family of a stored value.
///
/// Range predicates and sort keys carry the semantic type so the engine
/// compares numerically or lexically as appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    /// 64-bit signed integer (also booleans, date-times and durations).
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Lexically compared string.
    String,
}

impl SemanticType {
    /// Whether values of this type can take part in numeric ranges.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, SemanticType::String)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Long => "long",
            SemanticType::Float => "float",
            SemanticType::Double => "double",
            SemanticType::String => "string",
        };
        f.write_str(name)
    }
}

/// A single typed value of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Integer family, booleans and tick counts.
    Long(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// String value.
    String(String),
}

impl FieldValue {
    /// Get the semantic type of this value.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            FieldValue::Long(_) => SemanticType::Long,
            FieldValue::Float(_) => SemanticType::Float,
            FieldValue::Double(_) => SemanticType::Double,
            FieldValue::String(_) => SemanticType::String,
        }
    }

    /// Convert to text if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen any numeric value to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Long(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            FieldValue::String(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Long(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Double(v) => write!(f, "{v}"),
            FieldValue::String(v) => f.write_str(v),
        }
    }
}

/// Indexing options of a field.
///
/// `indexed` fields can be matched and sorted on, `stored` fields are
/// returned verbatim when a hit is resolved, `analyzed` string fields are
/// tokenized before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Whether the value is searchable.
    pub indexed: bool,
    /// Whether the value is returned with the document.
    pub stored: bool,
    /// Whether the value is tokenized.
    pub analyzed: bool,
}

impl FieldOption {
    /// Indexed verbatim, not stored.
    pub fn exact() -> Self {
        FieldOption {
            indexed: true,
            stored: false,
            analyzed: false,
        }
    }

    /// Stored only, never searchable.
    pub fn stored_only() -> Self {
        FieldOption {
            indexed: false,
            stored: true,
            analyzed: false,
        }
    }

    /// Set the stored flag.
    pub fn with_stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    /// Set the analyzed flag.
    pub fn with_analyzed(mut self, analyzed: bool) -> Self {
        self.analyzed = analyzed;
        self
    }
}

impl Default for FieldOption {
    fn default() -> Self {
        Self::exact()
    }
}

/// A named field entry of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Dotted field path.
    pub name: String,
    /// The field value.
    pub value: FieldValue,
    /// The field indexing options.
    pub option: FieldOption,
}

impl Field {
    /// Create a new field.
    pub fn new<S: Into<String>>(name: S, value: FieldValue, option: FieldOption) -> Self {
        Field {
            name: name.into(),
            value,
            option,
        }
    }
}
