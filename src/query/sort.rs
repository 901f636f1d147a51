//! Resolution of sort key selectors.

use crate::error::{DocmapError, Result};
use crate::query::expr::Expr;
use crate::query::field::MappedFieldResolver;
use crate::query::native::SortKey;

/// Turns key selector expressions into [`SortKey`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortResolver {
    resolver: MappedFieldResolver,
}

impl SortResolver {
    /// Create a new sort resolver.
    pub fn new() -> Self {
        SortResolver {
            resolver: MappedFieldResolver::new(),
        }
    }

    /// Resolve `selector` to a key on its physical field.
    ///
    /// The selector must be a pure property path with a mappable leaf type.
    pub fn resolve(&self, selector: &Expr, descending: bool) -> Result<SortKey> {
        let field = self.resolver.resolve(selector)?.ok_or_else(|| {
            DocmapError::unsupported_expression(format!(
                "sort selector {selector} is not a property path"
            ))
        })?;

        Ok(SortKey {
            field: field.name().to_string(),
            kind: field.semantic_type(),
            descending,
        })
    }
}
