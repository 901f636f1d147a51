//! Object ⇄ document mapping.

use std::any::Any;
use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::MappingConfig;
use crate::document::document::Document;
use crate::error::Result;
use crate::mapping::conventions::FieldConventions;
use crate::mapping::envelope::{EnvelopeTypes, TypeEnvelope, TypeIdentity};
use crate::mapping::registry::TypeRegistry;
use crate::mapping::serializer::FieldEmitter;

/// Capability of turning a `T` into a document and back.
///
/// [`FieldMapper`] is the production implementation for every serde type.
/// Alternate strategies are injected where a query or write is issued
/// instead of replacing the mapper globally.
pub trait DocumentMapper<T>: Send + Sync + Debug {
    /// Build the complete document for `value`, envelope included.
    fn to_document(&self, value: &T, types: &EnvelopeTypes) -> Result<Document>;

    /// Rebuild a value from a document returned by the engine.
    fn to_object(&self, document: &Document) -> Result<T>;
}

/// Serde-driven mapper.
///
/// Projection flattens the serde data model into dotted field paths (see
/// [`serializer`](crate::mapping::serializer)); reconstruction decodes the
/// JSON payload recorded in the envelope.
///
/// # Example
///
/// ```
/// use docmap::mapping::{EnvelopeTypes, FieldMapper};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Book {
///     title: String,
///     tags: Vec<String>,
/// }
///
/// let mapper = FieldMapper::default();
/// let book = Book { title: "Dune".into(), tags: vec!["sf".into(), "classic".into()] };
///
/// let document = mapper.to_document(&book, &EnvelopeTypes::of::<Book>()).unwrap();
/// assert_eq!(document.values("tags").count(), 2);
///
/// let restored: Book = mapper.reconstruct(&document).unwrap();
/// assert_eq!(restored, book);
/// ```
#[derive(Debug)]
pub struct FieldMapper {
    config: MappingConfig,
    conventions: FieldConventions,
    envelope: TypeEnvelope,
}

impl FieldMapper {
    /// Create a mapper with default conventions.
    pub fn new(config: MappingConfig) -> Self {
        FieldMapper {
            envelope: TypeEnvelope::new(config.store_source),
            conventions: FieldConventions::default(),
            config,
        }
    }

    /// Replace the conventions.
    pub fn with_conventions(mut self, conventions: FieldConventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Get the mapper configuration.
    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Get the conventions.
    pub fn conventions(&self) -> &FieldConventions {
        &self.conventions
    }

    /// Project `value` into field entries, without the envelope.
    pub fn project<T: Serialize + ?Sized>(&self, value: &T) -> Result<Document> {
        let fields =
            FieldEmitter::new(&self.conventions, self.config.max_depth).project(value)?;
        Ok(fields.into_iter().collect())
    }

    /// Project `value` and append the envelope.
    ///
    /// Either the whole document is built or an error is returned; nothing
    /// partial escapes.
    pub fn to_document<T: Serialize + ?Sized>(
        &self,
        value: &T,
        types: &EnvelopeTypes,
    ) -> Result<Document> {
        let mut document = self.project(value)?;
        self.envelope.apply(&mut document, value, types)?;
        log::trace!(
            "projected {} into {} field entries",
            types.actual,
            document.len()
        );
        Ok(document)
    }

    /// Rebuild a `T` from the source payload.
    pub fn reconstruct<T: DeserializeOwned>(&self, document: &Document) -> Result<T> {
        TypeEnvelope::decode(document)
    }

    /// Rebuild a value of the recorded actual type, using `registry` to
    /// find its decoder.
    pub fn reconstruct_dynamic(
        &self,
        document: &Document,
        registry: &TypeRegistry,
    ) -> Result<Box<dyn Any + Send>> {
        let payload = TypeEnvelope::decode_raw(document)?;
        let identity = TypeEnvelope::actual_type(document)
            .unwrap_or_else(|| TypeIdentity::from_canonical(payload.type_name.clone()));
        registry.decode(&identity, payload.value)
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(MappingConfig::default())
    }
}

impl<T> DocumentMapper<T> for FieldMapper
where
    T: Serialize + DeserializeOwned,
{
    fn to_document(&self, value: &T, types: &EnvelopeTypes) -> Result<Document> {
        FieldMapper::to_document(self, value, types)
    }

    fn to_object(&self, document: &Document) -> Result<T> {
        self.reconstruct(document)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, TimeDelta, Utc};
    use serde::Deserialize;

    use super::*;
    use crate::document::field::FieldValue;
    use crate::error::DocmapError;
    use crate::mapping::envelope::{ACTUAL_TYPE_FIELD, SOURCE_FIELD};
    use crate::mapping::leaf::LeafKind;
    use crate::mapping::ticks::Ticks;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inner {
        label: Option<String>,
        weights: Vec<f64>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Outer {
        id: uuid::Uuid,
        count: i32,
        flag: bool,
        note: Option<String>,
        created: Ticks<DateTime<Utc>>,
        elapsed: Ticks<TimeDelta>,
        inner: Inner,
        names: Vec<String>,
        attributes: BTreeMap<String, String>,
    }

    fn outer() -> Outer {
        let mut attributes = BTreeMap::new();
        attributes.insert("color".to_string(), "blue".to_string());
        Outer {
            id: uuid::Uuid::new_v4(),
            count: -3,
            flag: false,
            note: None,
            created: Ticks(DateTime::from_timestamp(1_600_000_000, 0).unwrap()),
            elapsed: Ticks(TimeDelta::seconds(42)),
            inner: Inner {
                label: Some("x".into()),
                weights: vec![0.25, 0.5],
            },
            names: vec!["alpha".into(), "beta".into()],
            attributes,
        }
    }

    #[test]
    fn test_round_trip() {
        let mapper = FieldMapper::default();
        let value = outer();
        let document = mapper
            .to_document(&value, &EnvelopeTypes::of::<Outer>())
            .unwrap();

        let restored: Outer = mapper.reconstruct(&document).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_projection_fields() {
        let mapper = FieldMapper::default();
        let value = outer();
        let document = mapper.project(&value).unwrap();

        assert_eq!(
            document.get_str("id"),
            Some(value.id.to_string().as_str())
        );
        assert_eq!(document.get_field("flag").unwrap().value, FieldValue::Long(0));
        assert!(!document.has_field("note"));
        assert_eq!(document.values("inner.weights").count(), 2);
        assert_eq!(document.get_str("attributes.color"), Some("blue"));
        assert_eq!(
            document.get_field("elapsed").unwrap().value,
            FieldValue::Long(420_000_000)
        );
        assert!(!document.has_field(ACTUAL_TYPE_FIELD));
    }

    #[test]
    fn test_conventions_apply() {
        let mapper = FieldMapper::default().with_conventions(
            FieldConventions::default()
                .analyze_when(|path, _| path != "names")
                .store_when(|_, kind| kind == LeafKind::DateTime),
        );
        let document = mapper.project(&outer()).unwrap();

        assert!(!document.get_field("names").unwrap().option.analyzed);
        assert!(document.get_field("inner.label").unwrap().option.analyzed);
        assert!(document.get_field("created").unwrap().option.stored);
        assert!(!document.get_field("count").unwrap().option.stored);
    }

    #[test]
    fn test_without_source() {
        let mapper = FieldMapper::new(MappingConfig {
            store_source: false,
            ..MappingConfig::default()
        });
        let document = mapper
            .to_document(&outer(), &EnvelopeTypes::of::<Outer>())
            .unwrap();

        assert!(!document.has_field(SOURCE_FIELD));
        assert!(matches!(
            mapper.reconstruct::<Outer>(&document),
            Err(DocmapError::MissingSourcePayload(_))
        ));
    }

    #[test]
    fn test_reconstruct_dynamic_uses_actual_type() {
        let mapper = FieldMapper::default();
        let value = outer();
        let document = mapper
            .to_document(&value, &EnvelopeTypes::of_static::<dyn std::any::Any, Outer>())
            .unwrap();

        let mut registry = TypeRegistry::new();
        registry.register::<Outer>().register::<Inner>();

        let restored = mapper.reconstruct_dynamic(&document, &registry).unwrap();
        assert_eq!(restored.downcast_ref::<Outer>(), Some(&value));

        let empty = TypeRegistry::new();
        assert!(mapper.reconstruct_dynamic(&document, &empty).is_err());
        assert_eq!(
            TypeEnvelope::actual_type(&document),
            Some(TypeIdentity::of::<Outer>())
        );
    }

    #[test]
    fn test_failed_projection_builds_nothing() {
        #[derive(Serialize)]
        struct Bad {
            ok: i32,
            bad: u128,
        }
        let mapper = FieldMapper::default();
        assert!(matches!(
            mapper.to_document(&Bad { ok: 1, bad: 2 }, &EnvelopeTypes::of::<Bad>()),
            Err(DocmapError::UnsupportedType(_))
        ));
    }
}
