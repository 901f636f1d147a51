//! Typed predicate expressions.
//!
//! Queries are written against a small expression tree instead of
//! arbitrary code. Property paths are chains of [`Expr::Member`] nodes
//! rooted at [`Expr::Parameter`]; predicates are [`Expr::Range`],
//! [`Expr::Term`] and their conjunction [`Expr::And`]. The remaining node
//! kinds exist so that callers can express shapes the translator rejects.
//!
//! # Example
//!
//! ```
//! use docmap::query::expr::{object, property};
//!
//! let number = property::<i64>("number");
//! let city = object("address").property::<String>("city");
//!
//! let predicate = number.range(Some(2.into()), Some(9.into()), true, false)
//!     .and(city.term("kyoto"));
//! assert_eq!(
//!     predicate.to_string(),
//!     "(range(x.number, [2, 9)) && term(x.address.city, \"kyoto\"))"
//! );
//! ```

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::mapping::leaf::LeafKind;
use crate::mapping::ticks::Ticks;

/// Declared type of a property, as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticType {
    /// Scalar leaf.
    Leaf(LeafKind),
    /// Multi-valued property; compared element-wise.
    Sequence(Box<StaticType>),
    /// Nullable property.
    Optional(Box<StaticType>),
    /// Composite value; only valid in the middle of a path.
    Object(&'static str),
    /// A type with no field representation.
    Unsupported(&'static str),
}

/// Types that can appear as a property in a query path.
pub trait FieldType {
    /// The declared type.
    fn static_type() -> StaticType;
}

macro_rules! impl_leaf_field_type {
    ($kind:expr => $($ty:ty),+) => {
        $(
            impl FieldType for $ty {
                fn static_type() -> StaticType {
                    StaticType::Leaf($kind)
                }
            }
        )+
    };
}

impl_leaf_field_type!(LeafKind::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_leaf_field_type!(LeafKind::Float => f32);
impl_leaf_field_type!(LeafKind::Double => f64);
impl_leaf_field_type!(LeafKind::String => String, str, char, uuid::Uuid);
impl_leaf_field_type!(LeafKind::Boolean => bool);
impl_leaf_field_type!(LeafKind::DateTime => Ticks<DateTime<Utc>>);
impl_leaf_field_type!(LeafKind::Duration => Ticks<TimeDelta>);

// Bare chrono values serialize as strings; only `Ticks` indexes them as
// numbers, so a bare one in a path cannot be compared the way it reads.
impl FieldType for DateTime<Utc> {
    fn static_type() -> StaticType {
        StaticType::Unsupported("DateTime<Utc> (declare it as Ticks<DateTime<Utc>>)")
    }
}

impl FieldType for TimeDelta {
    fn static_type() -> StaticType {
        StaticType::Unsupported("TimeDelta (declare it as Ticks<TimeDelta>)")
    }
}

impl FieldType for i128 {
    fn static_type() -> StaticType {
        StaticType::Unsupported("i128")
    }
}

impl FieldType for u128 {
    fn static_type() -> StaticType {
        StaticType::Unsupported("u128")
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn static_type() -> StaticType {
        StaticType::Optional(Box::new(T::static_type()))
    }
}

impl<T: FieldType + ?Sized> FieldType for Box<T> {
    fn static_type() -> StaticType {
        T::static_type()
    }
}

macro_rules! impl_sequence_field_type {
    ($($ty:ident),+) => {
        $(
            impl<T: FieldType> FieldType for $ty<T> {
                fn static_type() -> StaticType {
                    StaticType::Sequence(Box::new(T::static_type()))
                }
            }
        )+
    };
}

impl_sequence_field_type!(Vec, VecDeque, BTreeSet, HashSet);

impl<T: FieldType> FieldType for [T] {
    fn static_type() -> StaticType {
        StaticType::Sequence(Box::new(T::static_type()))
    }
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Integer.
    Long(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// String.
    String(String),
    /// Boolean.
    Boolean(bool),
    /// Date-time.
    DateTime(DateTime<Utc>),
    /// Duration.
    Duration(TimeDelta),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Duration(v) => write!(f, "{v}"),
        }
    }
}

/// An operand read from captured state when the predicate is translated.
#[derive(Clone)]
pub struct Capture(Arc<dyn Fn() -> Value + Send + Sync>);

impl Capture {
    /// Wrap a thunk.
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Capture(Arc::new(thunk))
    }

    /// Evaluate the thunk.
    pub fn evaluate(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Capture(..)")
    }
}

/// Binary operators. None of them is translatable; predicates use
/// [`Expr::Range`] and [`Expr::Term`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        };
        f.write_str(symbol)
    }
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// The object being queried.
    Parameter,
    /// Property access on `target`.
    Member {
        target: Box<Expr>,
        name: String,
        ty: StaticType,
    },
    /// Literal operand.
    Constant(Value),
    /// Operand evaluated at translation time.
    Captured(Capture),
    /// Numeric range over a property. Open bounds are `None`.
    Range {
        field: Box<Expr>,
        min: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
        min_inclusive: bool,
        max_inclusive: bool,
    },
    /// Exact term equality on a property.
    Term { field: Box<Expr>, value: Box<Expr> },
    /// Conjunction.
    And(Vec<Expr>),
    /// Disjunction.
    Or(Vec<Expr>),
    /// Negation.
    Not(Box<Expr>),
    /// Comparison or arithmetic.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Method call.
    Call { method: String, args: Vec<Expr> },
}

impl Expr {
    /// Property access on `target`.
    pub fn member<S: Into<String>>(target: Expr, name: S, ty: StaticType) -> Expr {
        Expr::Member {
            target: Box::new(target),
            name: name.into(),
            ty,
        }
    }

    /// Literal operand.
    pub fn constant<V: Into<Value>>(value: V) -> Expr {
        Expr::Constant(value.into())
    }

    /// Operand read from captured state at translation time.
    pub fn captured<F>(thunk: F) -> Expr
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Expr::Captured(Capture::new(thunk))
    }

    /// Comparison or arithmetic node.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Method call node.
    pub fn call<S: Into<String>>(method: S, args: Vec<Expr>) -> Expr {
        Expr::Call {
            method: method.into(),
            args,
        }
    }

    /// Conjunction with another predicate.
    pub fn and(self, other: Expr) -> Expr {
        match self {
            Expr::And(mut clauses) => {
                clauses.push(other);
                Expr::And(clauses)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    /// Disjunction with another predicate.
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(vec![self, other])
    }

    /// Negation.
    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

/// Conjunction of any number of predicates.
pub fn and<I: IntoIterator<Item = Expr>>(clauses: I) -> Expr {
    Expr::And(clauses.into_iter().collect())
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter => f.write_str("x"),
            Expr::Member { target, name, .. } => write!(f, "{target}.{name}"),
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Captured(_) => f.write_str("<captured>"),
            Expr::Range {
                field,
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => {
                write!(f, "range({field}, {}", if *min_inclusive { '[' } else { '(' })?;
                match min {
                    Some(min) => write!(f, "{min}")?,
                    None => f.write_str("*")?,
                }
                f.write_str(", ")?;
                match max {
                    Some(max) => write!(f, "{max}")?,
                    None => f.write_str("*")?,
                }
                write!(f, "{})", if *max_inclusive { ']' } else { ')' })
            }
            Expr::Term { field, value } => write!(f, "term({field}, {value})"),
            Expr::And(clauses) => {
                f.write_str("(")?;
                write_list(f, clauses, " && ")?;
                f.write_str(")")
            }
            Expr::Or(clauses) => {
                f.write_str("(")?;
                write_list(f, clauses, " || ")?;
                f.write_str(")")
            }
            Expr::Not(inner) => write!(f, "!{inner}"),
            Expr::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::Call { method, args } => {
                write!(f, "{method}(")?;
                write_list(f, args, ", ")?;
                f.write_str(")")
            }
        }
    }
}

macro_rules! impl_value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }

            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Constant(Value::from(v))
                }
            }
        )+
    };
}

impl_value_from!(Long: i8, i16, i32, i64, u8, u16, u32);
impl_value_from!(Float: f32);
impl_value_from!(Double: f64);
impl_value_from!(Boolean: bool);
impl_value_from!(String: String, &str);
impl_value_from!(DateTime: DateTime<Utc>);
impl_value_from!(Duration: TimeDelta);

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::String(v.to_string())
    }
}

impl From<uuid::Uuid> for Expr {
    fn from(v: uuid::Uuid) -> Self {
        Expr::Constant(Value::from(v))
    }
}

impl<T: Into<Value>> From<Ticks<T>> for Value {
    fn from(v: Ticks<T>) -> Self {
        v.into_inner().into()
    }
}

impl<T: Into<Value>> From<Ticks<T>> for Expr {
    fn from(v: Ticks<T>) -> Self {
        Expr::Constant(Value::from(v))
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Constant(v)
    }
}

impl From<Capture> for Expr {
    fn from(capture: Capture) -> Self {
        Expr::Captured(capture)
    }
}

/// A typed property path.
///
/// The type parameter is the declared type of the last segment; it drives
/// leaf classification and keeps operands honest at the call site.
pub struct Property<T: ?Sized> {
    expr: Expr,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> Clone for Property<T> {
    fn clone(&self) -> Self {
        Property {
            expr: self.expr.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&self.expr.to_string()).finish()
    }
}

/// A top-level property of the queried object.
pub fn property<T: FieldType + ?Sized>(name: &str) -> Property<T> {
    Property {
        expr: Expr::member(Expr::Parameter, name, T::static_type()),
        _marker: PhantomData,
    }
}

/// A top-level composite property, for building nested paths.
pub fn object(name: &str) -> ObjectPath {
    ObjectPath {
        expr: Expr::member(Expr::Parameter, name, StaticType::Object("object")),
    }
}

impl<T: FieldType + ?Sized> Property<T> {
    /// The underlying member-access expression.
    pub fn expr(&self) -> Expr {
        self.expr.clone()
    }

    /// Range predicate with optional bounds.
    pub fn range(
        &self,
        min: Option<Expr>,
        max: Option<Expr>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Expr {
        Expr::Range {
            field: Box::new(self.expr()),
            min: min.map(Box::new),
            max: max.map(Box::new),
            min_inclusive,
            max_inclusive,
        }
    }

    /// `min <= x <= max`.
    pub fn between<A: Into<Expr>, B: Into<Expr>>(&self, min: A, max: B) -> Expr {
        self.range(Some(min.into()), Some(max.into()), true, true)
    }

    /// `x > value`.
    pub fn greater_than<V: Into<Expr>>(&self, value: V) -> Expr {
        self.range(Some(value.into()), None, false, false)
    }

    /// `x >= value`.
    pub fn at_least<V: Into<Expr>>(&self, value: V) -> Expr {
        self.range(Some(value.into()), None, true, false)
    }

    /// `x < value`.
    pub fn less_than<V: Into<Expr>>(&self, value: V) -> Expr {
        self.range(None, Some(value.into()), false, false)
    }

    /// `x <= value`.
    pub fn at_most<V: Into<Expr>>(&self, value: V) -> Expr {
        self.range(None, Some(value.into()), false, true)
    }

    /// Exact term equality. String terms are matched verbatim and must
    /// already be in the indexed (normalized) form.
    pub fn term<V: Into<Expr>>(&self, value: V) -> Expr {
        Expr::Term {
            field: Box::new(self.expr()),
            value: Box::new(value.into()),
        }
    }
}

impl<T: ?Sized> From<Property<T>> for Expr {
    fn from(property: Property<T>) -> Self {
        property.expr
    }
}

impl<T: ?Sized> From<&Property<T>> for Expr {
    fn from(property: &Property<T>) -> Self {
        property.expr.clone()
    }
}

/// A composite property in the middle of a path.
#[derive(Debug, Clone)]
pub struct ObjectPath {
    expr: Expr,
}

impl ObjectPath {
    /// Descend into a nested composite.
    pub fn object(&self, name: &str) -> ObjectPath {
        ObjectPath {
            expr: Expr::member(self.expr.clone(), name, StaticType::Object("object")),
        }
    }

    /// A leaf (or sequence) property under this composite.
    pub fn property<T: FieldType + ?Sized>(&self, name: &str) -> Property<T> {
        Property {
            expr: Expr::member(self.expr.clone(), name, T::static_type()),
            _marker: PhantomData,
        }
    }
}

impl From<ObjectPath> for Expr {
    fn from(path: ObjectPath) -> Self {
        path.expr
    }
}
