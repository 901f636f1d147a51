//! Resolution of property paths to physical fields.

use crate::document::field::SemanticType;
use crate::error::{DocmapError, Result};
use crate::mapping::leaf::LeafKind;
use crate::query::expr::{Expr, StaticType};

/// A property path resolved to its physical field.
///
/// Created on demand during translation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    name: String,
    semantic_type: SemanticType,
    leaf_kind: LeafKind,
}

impl MappedField {
    /// Dotted field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Comparator family of the field.
    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    /// Leaf kind the values were projected from.
    pub fn leaf_kind(&self) -> LeafKind {
        self.leaf_kind
    }
}

/// Classify a declared type, looking through sequences and options.
pub fn classify(ty: &StaticType) -> Result<LeafKind> {
    match ty {
        StaticType::Leaf(kind) => Ok(*kind),
        StaticType::Sequence(element) | StaticType::Optional(element) => classify(element),
        StaticType::Object(name) => Err(DocmapError::unmappable_type(format!(
            "{name} is a composite and cannot be queried or sorted on directly"
        ))),
        StaticType::Unsupported(name) => Err(DocmapError::unmappable_type(format!(
            "{name} has no field representation"
        ))),
    }
}

/// Resolves member-access chains to [`MappedField`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappedFieldResolver;

impl MappedFieldResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        MappedFieldResolver
    }

    /// Resolve a property path.
    ///
    /// Returns `Ok(None)` when the expression is not a pure property path
    /// rooted at the queried object, and `UnmappableType` when it is one
    /// but its leaf type cannot be mapped.
    pub fn resolve(&self, expr: &Expr) -> Result<Option<MappedField>> {
        let Expr::Member { ty, .. } = expr else {
            return Ok(None);
        };

        let mut segments = Vec::new();
        let mut current = expr;
        loop {
            match current {
                Expr::Member { target, name, .. } => {
                    if name.is_empty() {
                        return Err(DocmapError::invalid_argument("empty property name"));
                    }
                    segments.push(name.as_str());
                    current = target;
                }
                Expr::Parameter => break,
                _ => return Ok(None),
            }
        }
        segments.reverse();

        let leaf_kind = classify(ty)?;
        Ok(Some(MappedField {
            name: segments.join("."),
            semantic_type: leaf_kind.semantic_type(),
            leaf_kind,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expr::{BinaryOp, object, property};

    #[test]
    fn test_resolve_nested_path() {
        let resolver = MappedFieldResolver::new();
        let expr = object("a").object("b").property::<f32>("c").expr();

        let field = resolver.resolve(&expr).unwrap().unwrap();
        assert_eq!(field.name(), "a.b.c");
        assert_eq!(field.semantic_type(), SemanticType::Float);
        assert_eq!(field.leaf_kind(), LeafKind::Float);
    }

    #[test]
    fn test_sequence_uses_element_type() {
        let resolver = MappedFieldResolver::new();
        let field = resolver
            .resolve(&property::<Vec<Option<bool>>>("flags").expr())
            .unwrap()
            .unwrap();
        assert_eq!(field.semantic_type(), SemanticType::Long);
        assert_eq!(field.leaf_kind(), LeafKind::Boolean);
    }

    #[test]
    fn test_non_member_nodes_are_unmapped() {
        let resolver = MappedFieldResolver::new();
        let n = property::<i32>("n");

        let sum = Expr::binary(BinaryOp::Add, n.expr(), Expr::constant(1));
        assert!(resolver.resolve(&sum).unwrap().is_none());

        let through_call = Expr::member(
            Expr::call("lookup", vec![]),
            "n",
            i32_type(),
        );
        assert!(resolver.resolve(&through_call).unwrap().is_none());
        assert!(resolver.resolve(&Expr::Parameter).unwrap().is_none());
    }

    fn i32_type() -> StaticType {
        StaticType::Leaf(LeafKind::Integer)
    }

    #[test]
    fn test_unsupported_types_fail() {
        let resolver = MappedFieldResolver::new();
        assert!(matches!(
            resolver.resolve(&property::<u128>("big").expr()),
            Err(DocmapError::UnmappableType(_))
        ));
        assert!(matches!(
            resolver.resolve(&object("address").into()),
            Err(DocmapError::UnmappableType(_))
        ));
    }
}
