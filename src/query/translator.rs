//! Translation of predicate expressions into native queries.

use crate::document::field::SemanticType;
use crate::error::{DocmapError, Result};
use crate::mapping::ticks;
use crate::query::expr::{Expr, Value};
use crate::query::field::{MappedField, MappedFieldResolver};
use crate::query::native::{NativeQuery, NumericRange, NumericValue};

/// Translates predicate expressions into [`NativeQuery`]s.
///
/// Only three shapes are accepted:
///
/// - [`Expr::Range`] over a numeric property,
/// - [`Expr::Term`] over any property (numeric terms become a point range),
/// - [`Expr::And`] of accepted shapes.
///
/// Anything else fails with [`DocmapError::UnsupportedExpression`]; no
/// partial translation is returned. Captured operands are evaluated once
/// per call, while translating.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryTranslator {
    resolver: MappedFieldResolver,
}

impl QueryTranslator {
    /// Create a new translator.
    pub fn new() -> Self {
        QueryTranslator {
            resolver: MappedFieldResolver::new(),
        }
    }

    /// Get the field resolver.
    pub fn resolver(&self) -> &MappedFieldResolver {
        &self.resolver
    }

    /// Translate a predicate.
    pub fn translate(&self, expr: &Expr) -> Result<NativeQuery> {
        let query = self.visit(expr)?;
        log::debug!("translated {expr} into {query}");
        Ok(query)
    }

    fn visit(&self, expr: &Expr) -> Result<NativeQuery> {
        match expr {
            Expr::Range {
                field,
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => {
                let field = self.field(field)?;
                if !field.semantic_type().is_numeric() {
                    return Err(DocmapError::unsupported_expression(format!(
                        "range over non-numeric field '{}'",
                        field.name()
                    )));
                }
                let min = match min {
                    Some(min) => numeric(&field, &self.operand(min)?)?,
                    None => None,
                };
                let max = match max {
                    Some(max) => numeric(&field, &self.operand(max)?)?,
                    None => None,
                };
                Ok(NativeQuery::NumericRange(NumericRange {
                    field: field.name().to_string(),
                    kind: field.semantic_type(),
                    min,
                    max,
                    min_inclusive: *min_inclusive,
                    max_inclusive: *max_inclusive,
                }))
            }
            Expr::Term { field, value } => {
                let field = self.field(field)?;
                let value = self.operand(value)?;
                term(&field, value)
            }
            Expr::And(clauses) => clauses.iter().try_fold(NativeQuery::MatchAll, |query, clause| {
                Ok(query.intersect(self.visit(clause)?))
            }),
            other => Err(DocmapError::unsupported_expression(format!(
                "{other} is not a range, term or conjunction"
            ))),
        }
    }

    fn field(&self, expr: &Expr) -> Result<MappedField> {
        self.resolver.resolve(expr)?.ok_or_else(|| {
            DocmapError::unsupported_expression(format!("{expr} is not a property path"))
        })
    }

    fn operand(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Captured(capture) => Ok(capture.evaluate()),
            other => Err(DocmapError::unsupported_expression(format!(
                "operand {other} is neither a constant nor a captured value"
            ))),
        }
    }
}

fn term(field: &MappedField, value: Value) -> Result<NativeQuery> {
    if field.semantic_type() == SemanticType::String {
        return match value {
            Value::String(term) => Ok(NativeQuery::term(field.name(), term)),
            Value::Null => Err(DocmapError::invalid_argument(format!(
                "term on '{}' has a null operand",
                field.name()
            ))),
            other => Err(DocmapError::unsupported_expression(format!(
                "term on string field '{}' with non-string operand {other}",
                field.name()
            ))),
        };
    }

    match numeric(field, &value)? {
        Some(point) => Ok(NativeQuery::NumericRange(NumericRange {
            field: field.name().to_string(),
            kind: field.semantic_type(),
            min: Some(point),
            max: Some(point),
            min_inclusive: true,
            max_inclusive: true,
        })),
        None => Err(DocmapError::invalid_argument(format!(
            "term on '{}' has a null operand",
            field.name()
        ))),
    }
}

/// Convert an operand to a bound of the field's semantic type. `Null`
/// means an open bound.
fn numeric(field: &MappedField, value: &Value) -> Result<Option<NumericValue>> {
    let mismatch = || {
        DocmapError::unsupported_expression(format!(
            "operand {value} cannot be compared with {} field '{}'",
            field.semantic_type(),
            field.name()
        ))
    };

    let bound = match (field.semantic_type(), value) {
        (_, Value::Null) => return Ok(None),
        (SemanticType::Long, Value::Long(v)) => NumericValue::Long(*v),
        (SemanticType::Long, Value::Boolean(v)) => NumericValue::Long(i64::from(*v)),
        (SemanticType::Long, Value::DateTime(v)) => NumericValue::Long(
            ticks::from_datetime(v)
                .ok_or_else(|| DocmapError::invalid_argument(format!("{v} is outside the tick range")))?,
        ),
        (SemanticType::Long, Value::Duration(v)) => NumericValue::Long(
            ticks::from_duration(v)
                .ok_or_else(|| DocmapError::invalid_argument(format!("{v} is outside the tick range")))?,
        ),
        (SemanticType::Long, Value::Double(v)) if is_integral(*v) => NumericValue::Long(*v as i64),
        (SemanticType::Long, Value::Float(v)) if is_integral(f64::from(*v)) => {
            NumericValue::Long(*v as i64)
        }
        (SemanticType::Float, Value::Float(v)) => NumericValue::Float(*v),
        (SemanticType::Float, Value::Double(v)) => NumericValue::Float(*v as f32),
        (SemanticType::Float, Value::Long(v)) => NumericValue::Float(*v as f32),
        (SemanticType::Double, Value::Double(v)) => NumericValue::Double(*v),
        (SemanticType::Double, Value::Float(v)) => NumericValue::Double(f64::from(*v)),
        (SemanticType::Double, Value::Long(v)) => NumericValue::Double(*v as f64),
        _ => return Err(mismatch()),
    };
    Ok(Some(bound))
}

fn is_integral(v: f64) -> bool {
    v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64
}
