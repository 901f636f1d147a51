//! Leaf classification shared by projection and query translation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::field::SemanticType;

/// The kind of a scalar leaf, before it is encoded into a field value.
///
/// Conventions are keyed by leaf kind, so a caller can for example store
/// every date-time verbatim without storing plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    /// Signed or unsigned integer that fits in i64.
    Integer,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Strings, chars, and values that serialize as strings (URLs, UUIDs).
    String,
    /// Boolean, encoded as 0/1.
    Boolean,
    /// Date-time, encoded as a tick count.
    DateTime,
    /// Duration, encoded as a tick count.
    Duration,
}

impl LeafKind {
    /// The semantic type a leaf of this kind is stored under.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            LeafKind::Integer | LeafKind::Boolean | LeafKind::DateTime | LeafKind::Duration => {
                SemanticType::Long
            }
            LeafKind::Float => SemanticType::Float,
            LeafKind::Double => SemanticType::Double,
            LeafKind::String => SemanticType::String,
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_encodings_are_long() {
        for kind in [
            LeafKind::Integer,
            LeafKind::Boolean,
            LeafKind::DateTime,
            LeafKind::Duration,
        ] {
            assert_eq!(kind.semantic_type(), SemanticType::Long);
        }
        assert_eq!(LeafKind::Float.semantic_type(), SemanticType::Float);
        assert_eq!(LeafKind::Double.semantic_type(), SemanticType::Double);
        assert_eq!(LeafKind::String.semantic_type(), SemanticType::String);
    }
}
