//! Registry of decodable types, keyed by type identity.
//!
//! Used when a document is reconstructed without a caller-provided type:
//! the recorded actual identity selects the decoder.

use std::any::Any;
use std::fmt;

use ahash::AHashMap;
use serde::de::DeserializeOwned;

use crate::error::{DocmapError, Result};
use crate::mapping::envelope::TypeIdentity;

type Decoder = fn(serde_json::Value) -> Result<Box<dyn Any + Send>>;

fn decode<T: DeserializeOwned + Send + 'static>(value: serde_json::Value) -> Result<Box<dyn Any + Send>> {
    let decoded: T = serde_json::from_value(value).map_err(|e| {
        DocmapError::corrupt_source(format!(
            "cannot decode {} payload: {e}",
            std::any::type_name::<T>()
        ))
    })?;
    Ok(Box::new(decoded))
}

/// Maps type identities to decoders.
#[derive(Default)]
pub struct TypeRegistry {
    decoders: AHashMap<TypeIdentity, Decoder>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its derived identity.
    pub fn register<T: DeserializeOwned + Send + 'static>(&mut self) -> &mut Self {
        self.register_as::<T>(TypeIdentity::of::<T>())
    }

    /// Register `T` under an explicit identity.
    pub fn register_as<T: DeserializeOwned + Send + 'static>(
        &mut self,
        identity: TypeIdentity,
    ) -> &mut Self {
        self.decoders.insert(identity, decode::<T>);
        self
    }

    /// Whether a decoder exists for `identity`.
    pub fn contains(&self, identity: &TypeIdentity) -> bool {
        self.decoders.contains_key(identity)
    }

    /// Decode a payload value as the type registered for `identity`.
    pub fn decode(&self, identity: &TypeIdentity, value: serde_json::Value) -> Result<Box<dyn Any + Send>> {
        let decoder = self.decoders.get(identity).ok_or_else(|| {
            DocmapError::unmappable_type(format!("no decoder registered for {identity}"))
        })?;
        decoder(value)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}
