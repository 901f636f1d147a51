//! Object-to-document mapping.
//!
//! This module projects serde-serializable objects into flat [`Document`]s
//! and reconstructs them from the stored source payload.
//!
//! [`Document`]: crate::document::Document

pub mod conventions;
pub mod envelope;
pub mod leaf;
pub mod mapper;
pub mod registry;
pub mod serializer;
pub mod ticks;

pub use self::conventions::FieldConventions;
pub use self::envelope::{EnvelopeTypes, TypeEnvelope, TypeIdentity};
pub use self::leaf::LeafKind;
pub use self::mapper::{DocumentMapper, FieldMapper};
pub use self::registry::TypeRegistry;
pub use self::ticks::Ticks;
