//! Type restriction filters.

use crate::mapping::envelope::{ACTUAL_TYPE_FIELD, STATIC_TYPE_FIELD, TypeIdentity};
use crate::query::native::NativeQuery;

/// Which recorded type a filter matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilterKind {
    /// The concrete runtime type of the stored object.
    Actual,
    /// The type the object was added as.
    Static,
}

/// Builds filters restricting results to one type.
///
/// Type filters are non-scoring and applied as a filter, never as part of
/// the main query.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeFilter;

impl TypeFilter {
    /// Filter matching documents whose recorded type equals `identity`.
    pub fn filter_for(identity: &TypeIdentity, kind: TypeFilterKind) -> NativeQuery {
        let field = match kind {
            TypeFilterKind::Actual => ACTUAL_TYPE_FIELD,
            TypeFilterKind::Static => STATIC_TYPE_FIELD,
        };
        NativeQuery::term(field, identity.as_str())
    }
}
