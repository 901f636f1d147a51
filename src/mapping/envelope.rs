//! Type envelope: the reserved metadata fields of every mapped document.
//!
//! | field          | content                         | options              |
//! |----------------|---------------------------------|----------------------|
//! | `$type`        | actual type identity            | exact, stored        |
//! | `$static_type` | static (declared) type identity | exact, stored        |
//! | `$source`      | JSON source payload (optional)  | stored only          |
//! | `$timestamp`   | write time in ticks             | stored only          |

use std::any::type_name;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::document::document::Document;
use crate::document::field::{Field, FieldOption, FieldValue};
use crate::error::{DocmapError, Result};
use crate::mapping::ticks;

/// Field holding the actual type identity.
pub const ACTUAL_TYPE_FIELD: &str = "$type";

/// Field holding the static type identity.
pub const STATIC_TYPE_FIELD: &str = "$static_type";

/// Field holding the serialized source payload.
pub const SOURCE_FIELD: &str = "$source";

/// Field holding the write timestamp.
pub const TIMESTAMP_FIELD: &str = "$timestamp";

/// All reserved envelope field names.
pub const RESERVED_FIELDS: [&str; 4] = [
    ACTUAL_TYPE_FIELD,
    STATIC_TYPE_FIELD,
    SOURCE_FIELD,
    TIMESTAMP_FIELD,
];

/// Check whether a field name is reserved for the envelope.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// Canonical type identity: `"{fully-qualified type name}, {crate name}"`.
///
/// Derived from [`std::any::type_name`], which carries no version or build
/// metadata. The compiler does not promise that text is stable across
/// toolchains; hosts that need a pinned identity can build one with
/// [`TypeIdentity::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeIdentity(String);

impl TypeIdentity {
    /// Derive the identity of a type. Trait objects drop their `dyn` prefix.
    pub fn of<T: ?Sized>() -> Self {
        let full = type_name::<T>();
        let name = full.strip_prefix("dyn ").unwrap_or(full);
        let module = name.split("::").next().unwrap_or(name);
        TypeIdentity(format!("{name}, {module}"))
    }

    /// Build an identity from explicit parts.
    pub fn new<N: AsRef<str>, M: AsRef<str>>(name: N, module: M) -> Self {
        TypeIdentity(format!("{}, {}", name.as_ref(), module.as_ref()))
    }

    /// Wrap an identity string read back from a document.
    pub fn from_canonical<S: Into<String>>(canonical: S) -> Self {
        TypeIdentity(canonical.into())
    }

    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pair of identities recorded for one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeTypes {
    /// Type of the value actually written.
    pub actual: TypeIdentity,
    /// Type the value was written through.
    pub static_type: TypeIdentity,
}

impl EnvelopeTypes {
    /// Identities for a value written through its own type.
    pub fn of<T: ?Sized>() -> Self {
        Self::of_static::<T, T>()
    }

    /// Identities for a `T` written through the declared type `S`.
    pub fn of_static<S: ?Sized, T: ?Sized>() -> Self {
        EnvelopeTypes {
            actual: TypeIdentity::of::<T>(),
            static_type: TypeIdentity::of::<S>(),
        }
    }
}

/// Self-describing source payload: the actual type next to the value.
#[derive(Serialize, Deserialize)]
pub(crate) struct SourcePayload<V> {
    #[serde(rename = "type")]
    pub(crate) type_name: String,
    pub(crate) value: V,
}

/// Hands out strictly increasing write timestamps.
#[derive(Debug, Default)]
struct WriteClock {
    last: AtomicI64,
}

impl WriteClock {
    fn next(&self) -> i64 {
        let now = ticks::now();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }
}

/// Writes and reads the reserved envelope fields.
#[derive(Debug, Default)]
pub struct TypeEnvelope {
    store_source: bool,
    clock: WriteClock,
}

impl TypeEnvelope {
    /// Create an envelope writer.
    pub fn new(store_source: bool) -> Self {
        TypeEnvelope {
            store_source,
            clock: WriteClock::default(),
        }
    }

    /// Append the envelope fields for `value` to `document`.
    pub fn apply<T: Serialize + ?Sized>(
        &self,
        document: &mut Document,
        value: &T,
        types: &EnvelopeTypes,
    ) -> Result<()> {
        let identity = FieldOption::exact().with_stored(true);
        document.add_field(Field::new(
            ACTUAL_TYPE_FIELD,
            FieldValue::String(types.actual.as_str().to_string()),
            identity,
        ));
        document.add_field(Field::new(
            STATIC_TYPE_FIELD,
            FieldValue::String(types.static_type.as_str().to_string()),
            identity,
        ));

        if self.store_source {
            let payload = serde_json::to_string(&SourcePayload {
                type_name: types.actual.as_str().to_string(),
                value,
            })?;
            document.add_field(Field::new(
                SOURCE_FIELD,
                FieldValue::String(payload),
                FieldOption::stored_only(),
            ));
        }

        document.add_field(Field::new(
            TIMESTAMP_FIELD,
            FieldValue::Long(self.clock.next()),
            FieldOption::stored_only(),
        ));
        Ok(())
    }

    /// Decode the source payload into `T`.
    pub fn decode<T: DeserializeOwned>(document: &Document) -> Result<T> {
        let source = Self::source(document)?;
        let payload: SourcePayload<T> = serde_json::from_str(source).map_err(|e| {
            DocmapError::corrupt_source(format!(
                "cannot decode {} payload: {e}",
                type_name::<T>()
            ))
        })?;
        Ok(payload.value)
    }

    /// Decode the source payload without committing to a type.
    pub(crate) fn decode_raw(document: &Document) -> Result<SourcePayload<serde_json::Value>> {
        let source = Self::source(document)?;
        serde_json::from_str(source)
            .map_err(|e| DocmapError::corrupt_source(format!("cannot parse payload: {e}")))
    }

    /// The raw payload string.
    pub fn source(document: &Document) -> Result<&str> {
        match document.get_field(SOURCE_FIELD) {
            Some(field) => field.value.as_str().ok_or_else(|| {
                DocmapError::corrupt_source(format!("{SOURCE_FIELD} is not a string field"))
            }),
            None => Err(DocmapError::missing_source(match Self::actual_type(document) {
                Some(actual) => format!("document of type {actual} was written without its source"),
                None => "document was written without its source".to_string(),
            })),
        }
    }

    /// The recorded actual type.
    pub fn actual_type(document: &Document) -> Option<TypeIdentity> {
        document
            .get_str(ACTUAL_TYPE_FIELD)
            .map(TypeIdentity::from_canonical)
    }

    /// The recorded static type.
    pub fn static_type(document: &Document) -> Option<TypeIdentity> {
        document
            .get_str(STATIC_TYPE_FIELD)
            .map(TypeIdentity::from_canonical)
    }

    /// The recorded write timestamp in ticks.
    pub fn timestamp(document: &Document) -> Option<i64> {
        document
            .get_field(TIMESTAMP_FIELD)
            .and_then(|f| f.value.as_long())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Animal {}

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Dog {
        name: String,
    }

    impl Animal for Dog {}

    #[test]
    fn test_identity_canonical_form() {
        let identity = TypeIdentity::of::<Dog>();
        assert!(identity.as_str().ends_with("::Dog, docmap"));
        assert!(identity.as_str().starts_with("docmap::"));

        let dynamic = TypeIdentity::of::<dyn Animal>();
        assert!(dynamic.as_str().starts_with("docmap::"));
        assert!(dynamic.as_str().ends_with("::Animal, docmap"));

        assert_eq!(TypeIdentity::new("a::B", "a").as_str(), "a::B, a");
    }

    #[test]
    fn test_apply_and_decode() {
        let envelope = TypeEnvelope::new(true);
        let mut document = Document::new();
        let dog = Dog {
            name: "Rex".into(),
        };
        envelope
            .apply(&mut document, &dog, &EnvelopeTypes::of_static::<dyn Animal, Dog>())
            .unwrap();

        assert_eq!(TypeEnvelope::actual_type(&document), Some(TypeIdentity::of::<Dog>()));
        assert_eq!(
            TypeEnvelope::static_type(&document),
            Some(TypeIdentity::of::<dyn Animal>())
        );
        assert!(TypeEnvelope::timestamp(&document).is_some());

        let source = document.get_field(SOURCE_FIELD).unwrap();
        assert!(source.option.stored && !source.option.indexed);

        let decoded: Dog = TypeEnvelope::decode(&document).unwrap();
        assert_eq!(decoded, dog);
    }

    #[test]
    fn test_missing_and_corrupt_payload() {
        let envelope = TypeEnvelope::new(false);
        let mut document = Document::new();
        envelope
            .apply(&mut document, &Dog { name: "Rex".into() }, &EnvelopeTypes::of::<Dog>())
            .unwrap();
        assert!(!document.has_field(SOURCE_FIELD));
        assert!(matches!(
            TypeEnvelope::decode::<Dog>(&document),
            Err(DocmapError::MissingSourcePayload(_))
        ));

        let corrupt = Document::builder()
            .add_field(
                SOURCE_FIELD,
                FieldValue::String("{not json".into()),
                FieldOption::stored_only(),
            )
            .build();
        assert!(matches!(
            TypeEnvelope::decode::<Dog>(&corrupt),
            Err(DocmapError::CorruptSourcePayload(_))
        ));
    }

    #[test]
    fn test_timestamps_increase() {
        let envelope = TypeEnvelope::new(false);
        let mut previous = i64::MIN;
        for _ in 0..100 {
            let mut document = Document::new();
            envelope
                .apply(&mut document, &Dog { name: "a".into() }, &EnvelopeTypes::of::<Dog>())
                .unwrap();
            let stamp = TypeEnvelope::timestamp(&document).unwrap();
            assert!(stamp > previous);
            previous = stamp;
        }
    }
}
