//! Flattening serializer used by the field mapper.
//!
//! The object graph is walked through serde's data model. Structs, maps and
//! enum variants with data recurse under a dotted prefix; sequences and
//! tuples emit every element under the same name; scalars become one field
//! entry each. `None` and unit values produce nothing.

use serde::ser::{self, Impossible, Serialize};

use crate::document::field::{Field, FieldValue};
use crate::error::{DocmapError, Result};
use crate::mapping::conventions::FieldConventions;
use crate::mapping::envelope::is_reserved;
use crate::mapping::leaf::LeafKind;
use crate::mapping::ticks;

/// Collects the field entries of one root projection.
pub(crate) struct FieldEmitter<'c> {
    conventions: &'c FieldConventions,
    max_depth: usize,
    fields: Vec<Field>,
}

impl<'c> FieldEmitter<'c> {
    pub(crate) fn new(conventions: &'c FieldConventions, max_depth: usize) -> Self {
        FieldEmitter {
            conventions,
            max_depth,
            fields: Vec::new(),
        }
    }

    /// Project `value` and return the emitted entries.
    pub(crate) fn project<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Vec<Field>> {
        value.serialize(PathSerializer {
            emitter: &mut self,
            path: String::new(),
            depth: 0,
            marker: None,
        })?;
        Ok(self.fields)
    }

    fn emit(&mut self, path: &str, kind: LeafKind, value: FieldValue) -> Result<()> {
        if path.is_empty() {
            return Err(DocmapError::unsupported_type(
                "a scalar cannot be projected as a document root",
            ));
        }
        if path.split('.').any(str::is_empty) {
            return Err(DocmapError::invalid_argument(format!(
                "field path '{path}' has an empty segment"
            )));
        }
        if is_reserved(path) {
            return Err(DocmapError::invalid_argument(format!(
                "field path '{path}' collides with a reserved envelope field"
            )));
        }

        let option = self.conventions.option_for(path, kind);
        self.fields.push(Field::new(path, value, option));
        Ok(())
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn display(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

/// Serializes one value at a fixed path.
struct PathSerializer<'a, 'c> {
    emitter: &'a mut FieldEmitter<'c>,
    path: String,
    depth: usize,
    /// Leaf kind announced by a `Ticks` newtype.
    marker: Option<LeafKind>,
}

impl<'a, 'c> PathSerializer<'a, 'c> {
    fn leaf(self, kind: LeafKind, value: FieldValue) -> Result<()> {
        let kind = match (self.marker, &value) {
            (Some(marker), FieldValue::Long(_)) => marker,
            _ => kind,
        };
        self.emitter.emit(&self.path, kind, value)
    }

    fn check_depth(&self) -> Result<()> {
        if self.depth >= self.emitter.max_depth {
            return Err(DocmapError::unmappable_type(format!(
                "object graph at '{}' is nested deeper than {} levels (cyclic reference?)",
                display(&self.path),
                self.emitter.max_depth
            )));
        }
        Ok(())
    }

    fn enter(self) -> Result<Compound<'a, 'c>> {
        self.check_depth()?;
        Ok(Compound {
            emitter: self.emitter,
            path: self.path,
            depth: self.depth + 1,
            key: None,
        })
    }

    fn enter_sequence(self) -> Result<Compound<'a, 'c>> {
        if self.path.is_empty() {
            return Err(DocmapError::unsupported_type(
                "a sequence cannot be projected as a document root",
            ));
        }
        self.enter()
    }

    fn child(self, key: &str) -> Result<PathSerializer<'a, 'c>> {
        self.check_depth()?;
        Ok(PathSerializer {
            path: join(&self.path, key),
            emitter: self.emitter,
            depth: self.depth + 1,
            marker: None,
        })
    }

    fn unsupported(&self, what: &str) -> DocmapError {
        DocmapError::unsupported_type(format!("{what} at '{}'", display(&self.path)))
    }
}

impl<'a, 'c> ser::Serializer for PathSerializer<'a, 'c> {
    type Ok = ();
    type Error = DocmapError;
    type SerializeSeq = Compound<'a, 'c>;
    type SerializeTuple = Compound<'a, 'c>;
    type SerializeTupleStruct = Compound<'a, 'c>;
    type SerializeTupleVariant = Compound<'a, 'c>;
    type SerializeMap = Compound<'a, 'c>;
    type SerializeStruct = Compound<'a, 'c>;
    type SerializeStructVariant = Compound<'a, 'c>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.leaf(LeafKind::Boolean, FieldValue::Long(i64::from(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.leaf(LeafKind::Integer, FieldValue::Long(v))
    }

    fn serialize_i128(self, _v: i128) -> Result<()> {
        Err(self.unsupported("128-bit integer"))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        match i64::try_from(v) {
            Ok(v) => self.serialize_i64(v),
            Err(_) => Err(self.unsupported(&format!("unsigned value {v} beyond i64"))),
        }
    }

    fn serialize_u128(self, _v: u128) -> Result<()> {
        Err(self.unsupported("128-bit integer"))
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.leaf(LeafKind::Float, FieldValue::Float(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.leaf(LeafKind::Double, FieldValue::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.leaf(LeafKind::String, FieldValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.leaf(LeafKind::String, FieldValue::String(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(self.unsupported("byte buffer"))
    }

    fn serialize_none(self) -> Result<()> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.leaf(LeafKind::String, FieldValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        mut self,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        match name {
            ticks::DATETIME_MARKER => self.marker = Some(LeafKind::DateTime),
            ticks::DURATION_MARKER => self.marker = Some(LeafKind::Duration),
            _ => {}
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self.child(variant)?)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.enter_sequence()
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        self.enter_sequence()
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.enter_sequence()
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.child(variant)?.enter_sequence()
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.enter()
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.enter()
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.child(variant)?.enter()
    }
}

/// State of a container being flattened.
struct Compound<'a, 'c> {
    emitter: &'a mut FieldEmitter<'c>,
    path: String,
    depth: usize,
    key: Option<String>,
}

impl Compound<'_, '_> {
    /// Sequence element: same path as the container.
    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(PathSerializer {
            emitter: &mut *self.emitter,
            path: self.path.clone(),
            depth: self.depth,
            marker: None,
        })
    }

    /// Named member: the path gains one segment.
    fn member<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        value.serialize(PathSerializer {
            emitter: &mut *self.emitter,
            path: join(&self.path, key),
            depth: self.depth,
            marker: None,
        })
    }
}

impl ser::SerializeSeq for Compound<'_, '_> {
    type Ok = ();
    type Error = DocmapError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTuple for Compound<'_, '_> {
    type Ok = ();
    type Error = DocmapError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Compound<'_, '_> {
    type Ok = ();
    type Error = DocmapError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Compound<'_, '_> {
    type Ok = ();
    type Error = DocmapError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeMap for Compound<'_, '_> {
    type Ok = ();
    type Error = DocmapError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self
            .key
            .take()
            .ok_or_else(|| DocmapError::Serialization("map value without a key".to_string()))?;
        self.member(&key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStruct for Compound<'_, '_> {
    type Ok = ();
    type Error = DocmapError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.member(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Compound<'_, '_> {
    type Ok = ();
    type Error = DocmapError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.member(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Renders a map key as a path segment. Only scalar keys are accepted.
struct KeySerializer;

fn unsupported_key(what: &str) -> DocmapError {
    DocmapError::unsupported_type(format!("{what} used as a map key"))
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = DocmapError;
    type SerializeSeq = Impossible<String, DocmapError>;
    type SerializeTuple = Impossible<String, DocmapError>;
    type SerializeTupleStruct = Impossible<String, DocmapError>;
    type SerializeTupleVariant = Impossible<String, DocmapError>;
    type SerializeMap = Impossible<String, DocmapError>;
    type SerializeStruct = Impossible<String, DocmapError>;
    type SerializeStructVariant = Impossible<String, DocmapError>;

    fn serialize_bool(self, v: bool) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(unsupported_key("float"))
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(unsupported_key("float"))
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(unsupported_key("byte buffer"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(unsupported_key("null"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        Err(unsupported_key("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<String> {
        Err(unsupported_key(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(unsupported_key(name))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(unsupported_key("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(unsupported_key("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(unsupported_key(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported_key(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(unsupported_key("map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(unsupported_key(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported_key(name))
    }
}
