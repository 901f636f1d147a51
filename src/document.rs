//! Document module for schema-less indexing.
//!
//! This module provides the flat document structure objects are projected
//! into, and the typed field values it carries.

#[allow(clippy::module_inception)]
pub mod document;
pub mod field;

// Re-export commonly used types
pub use document::{Document, DocumentBuilder};
pub use field::{Field, FieldOption, FieldValue, SemanticType};
