//! Document structure for schema-less indexing.

use serde::{Deserialize, Serialize};

use crate::document::field::{Field, FieldOption, FieldValue};

/// A flat, field-based representation of a mapped object.
///
/// Fields keep their insertion order and a name may appear more than once;
/// repeated names carry the elements of a multi-valued (array) property in
/// their original order.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Document {
    /// The field entries of this document, in insertion order.
    fields: Vec<Field>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document { fields: Vec::new() }
    }

    /// Append a field entry.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Get the first entry of a field.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get every entry of a field, in order.
    pub fn get_fields<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.name == name)
    }

    /// Get every value of a field, in order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.get_fields(name).map(|f| &f.value)
    }

    /// Get the first string value of a field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_field(name).and_then(|f| f.value.as_str())
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Get all field entries.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Keep only stored entries, as returned by an engine on read.
    pub fn stored(&self) -> Document {
        Document {
            fields: self
                .fields
                .iter()
                .filter(|f| f.option.stored)
                .cloned()
                .collect(),
        }
    }

    /// Get the number of field entries.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

impl FromIterator<Field> for Document {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Document {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A builder for constructing documents in a fluent manner.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        DocumentBuilder {
            document: Document::new(),
        }
    }

    /// Add an exact (untokenized) string entry.
    pub fn add_string<S: Into<String>, T: Into<String>>(self, name: S, value: T) -> Self {
        self.add_field(name, FieldValue::String(value.into()), FieldOption::exact())
    }

    /// Add a tokenized string entry.
    pub fn add_text<S: Into<String>, T: Into<String>>(self, name: S, value: T) -> Self {
        self.add_field(
            name,
            FieldValue::String(value.into()),
            FieldOption::exact().with_analyzed(true),
        )
    }

    /// Add an integer entry.
    pub fn add_long<S: Into<String>>(self, name: S, value: i64) -> Self {
        self.add_field(name, FieldValue::Long(value), FieldOption::exact())
    }

    /// Add an entry with explicit options.
    pub fn add_field<S: Into<String>>(
        mut self,
        name: S,
        value: FieldValue,
        option: FieldOption,
    ) -> Self {
        self.document.add_field(Field::new(name, value, option));
        self
    }

    /// Build the final document.
    pub fn build(self) -> Document {
        self.document
    }
}
