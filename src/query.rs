//! Typed queries over mapped objects.
//!
//! Predicates and sort selectors are written as [`Expr`] trees over typed
//! property paths, translated into the engine's [`NativeQuery`] algebra and
//! executed lazily in pages.

pub mod context;
pub mod executor;
pub mod expr;
pub mod field;
pub mod native;
pub mod sort;
pub mod translator;
pub mod type_filter;
pub mod typed;

pub use self::context::{ContextState, QueryContext};
pub use self::executor::{DocumentIter, QueryExecutor};
pub use self::expr::{Expr, FieldType, ObjectPath, Property, StaticType, Value, and, object, property};
pub use self::field::{MappedField, MappedFieldResolver};
pub use self::native::{NativeQuery, NumericRange, NumericValue, SortKey, SortSpec};
pub use self::sort::SortResolver;
pub use self::translator::QueryTranslator;
pub use self::type_filter::{TypeFilter, TypeFilterKind};
pub use self::typed::{Results, TypedQuery};
