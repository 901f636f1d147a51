//! Configuration for mapping and query execution.

use serde::{Deserialize, Serialize};

/// Default number of hits fetched per batch during unbounded enumeration.
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// Default bound on object graph nesting during projection.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration of the field mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Write the serialized object into the `$source` field.
    ///
    /// Documents written without it can be searched and counted but not
    /// reconstructed.
    pub store_source: bool,

    /// Maximum nesting depth of a projected object graph. Deeper graphs
    /// (including cyclic ones) are rejected.
    pub max_depth: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            store_source: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration of the query executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Hits fetched per engine round trip when no `take` is set.
    pub batch_size: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Configuration of an [`ObjectIndex`](crate::index::ObjectIndex).
///
/// # Example
///
/// ```
/// use docmap::config::IndexConfig;
///
/// let config = IndexConfig::builder()
///     .store_source(true)
///     .batch_size(500)
///     .build();
/// assert_eq!(config.executor.batch_size, 500);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Mapper settings.
    #[serde(default)]
    pub mapping: MappingConfig,
    /// Executor settings.
    #[serde(default)]
    pub executor: ExecutorConfig,
}

impl IndexConfig {
    /// Create a new builder for IndexConfig.
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::new()
    }
}

/// Builder for IndexConfig.
#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    store_source: Option<bool>,
    max_depth: Option<usize>,
    batch_size: Option<usize>,
}

impl IndexConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the source payload is stored.
    pub fn store_source(mut self, store: bool) -> Self {
        self.store_source = Some(store);
        self
    }

    /// Set the maximum projection depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set the enumeration batch size. Zero is raised to one.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size.max(1));
        self
    }

    /// Build the IndexConfig.
    pub fn build(self) -> IndexConfig {
        let mapping = MappingConfig::default();
        let executor = ExecutorConfig::default();
        IndexConfig {
            mapping: MappingConfig {
                store_source: self.store_source.unwrap_or(mapping.store_source),
                max_depth: self.max_depth.unwrap_or(mapping.max_depth),
            },
            executor: ExecutorConfig {
                batch_size: self.batch_size.unwrap_or(executor.batch_size),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert!(config.mapping.store_source);
        assert_eq!(config.mapping.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.executor.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_builder_overrides() {
        let config = IndexConfig::builder()
            .store_source(false)
            .max_depth(4)
            .batch_size(0)
            .build();
        assert!(!config.mapping.store_source);
        assert_eq!(config.mapping.max_depth, 4);
        assert_eq!(config.executor.batch_size, 1);
    }

    #[test]
    fn test_config_from_json() {
        let config: IndexConfig =
            serde_json::from_str(r#"{ "executor": { "batch_size": 10 } }"#).unwrap();
        assert_eq!(config.executor.batch_size, 10);
        assert_eq!(config.mapping, MappingConfig::default());
    }
}
