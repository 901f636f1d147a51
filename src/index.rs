//! High-level object index combining mapping, writing and querying.
//!
//! [`ObjectIndex`] is the entry point most hosts use: it projects objects
//! into documents on write and hands out [`TypedQuery`]s on read. The engine
//! is shared and owned by the caller; commit and flush timing stay with it.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::IndexConfig;
use crate::document::document::Document;
use crate::engine::SearchEngine;
use crate::error::Result;
use crate::mapping::envelope::{EnvelopeTypes, TypeIdentity};
use crate::mapping::mapper::{DocumentMapper, FieldMapper};
use crate::query::executor::QueryExecutor;
use crate::query::expr::Expr;
use crate::query::native::NativeQuery;
use crate::query::translator::QueryTranslator;
use crate::query::type_filter::{TypeFilter, TypeFilterKind};
use crate::query::typed::TypedQuery;

/// An index of serde objects on top of a [`SearchEngine`].
pub struct ObjectIndex {
    engine: Arc<dyn SearchEngine>,
    mapper: Arc<FieldMapper>,
    config: IndexConfig,
    translator: QueryTranslator,
}

impl fmt::Debug for ObjectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectIndex")
            .field("engine", &self.engine)
            .field("mapper", &self.mapper)
            .field("config", &self.config)
            .finish()
    }
}

impl ObjectIndex {
    /// Create an index with the default field conventions.
    pub fn new(engine: Arc<dyn SearchEngine>, config: IndexConfig) -> Self {
        let mapper = FieldMapper::new(config.mapping.clone());
        Self::with_mapper(engine, config, mapper)
    }

    /// Create an index with a preconfigured mapper.
    ///
    /// The mapper's own configuration wins over `config.mapping`.
    pub fn with_mapper(engine: Arc<dyn SearchEngine>, config: IndexConfig, mapper: FieldMapper) -> Self {
        let config = IndexConfig {
            mapping: mapper.config().clone(),
            ..config
        };
        ObjectIndex {
            engine,
            mapper: Arc::new(mapper),
            config,
            translator: QueryTranslator::new(),
        }
    }

    /// Get the engine.
    pub fn engine(&self) -> &Arc<dyn SearchEngine> {
        &self.engine
    }

    /// Get the mapper.
    pub fn mapper(&self) -> &FieldMapper {
        &self.mapper
    }

    /// Get the index configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Add an object, recording `T` as both its actual and static type.
    pub fn add<T: Serialize>(&self, value: &T) -> Result<()> {
        let document = self.mapper.to_document(value, &EnvelopeTypes::of::<T>())?;
        self.engine.write_document(document)
    }

    /// Add an object as `S`, typically a trait object type it is used as.
    ///
    /// Queries from [`query_static::<S, _>`](ObjectIndex::query_static) find
    /// it; queries from [`query::<T>`](ObjectIndex::query) do too.
    pub fn add_as<S: ?Sized, T: Serialize>(&self, value: &T) -> Result<()> {
        let document = self
            .mapper
            .to_document(value, &EnvelopeTypes::of_static::<S, T>())?;
        self.engine.write_document(document)
    }

    /// Add several objects. Every object is projected before the first
    /// write, so a projection failure writes nothing.
    pub fn add_all<'a, T, I>(&self, values: I) -> Result<usize>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let types = EnvelopeTypes::of::<T>();
        let documents = values
            .into_iter()
            .map(|value| self.mapper.to_document(value, &types))
            .collect::<Result<Vec<Document>>>()?;

        let count = documents.len();
        for document in documents {
            self.engine.write_document(document)?;
        }
        log::debug!("added {count} objects of {}", types.actual);
        Ok(count)
    }

    /// Add an object with an alternate mapper.
    pub fn add_with<T, M>(&self, mapper: &M, value: &T) -> Result<()>
    where
        M: DocumentMapper<T> + ?Sized,
    {
        let document = mapper.to_document(value, &EnvelopeTypes::of::<T>())?;
        self.engine.write_document(document)
    }

    /// Replace the `T` objects matching `key` with `value`.
    ///
    /// Atomicity is up to the engine's
    /// [`replace_by_query`](SearchEngine::replace_by_query): with the default
    /// implementation a failed write leaves the old objects deleted.
    pub fn update<T: Serialize, K: Into<Expr>>(&self, key: K, value: &T) -> Result<u64> {
        let query = self.key_query::<T>(&key.into())?;
        let document = self.mapper.to_document(value, &EnvelopeTypes::of::<T>())?;
        let replaced = self.engine.replace_by_query(&query, document)?;
        log::debug!("replaced {replaced} documents matching {query}");
        Ok(replaced)
    }

    /// Delete the `T` objects matching `key`.
    pub fn delete<T: ?Sized, K: Into<Expr>>(&self, key: K) -> Result<u64> {
        let query = self.key_query::<T>(&key.into())?;
        self.engine.delete_by_query(&query)
    }

    /// Delete every object whose actual type is `T`.
    pub fn delete_all<T: ?Sized>(&self) -> Result<u64> {
        self.engine
            .delete_by_query(&TypeFilter::filter_for(&TypeIdentity::of::<T>(), TypeFilterKind::Actual))
    }

    /// Query objects whose actual type is `T`.
    pub fn query<T>(&self) -> TypedQuery<T>
    where
        T: Serialize + DeserializeOwned,
    {
        self.query_with(Arc::clone(&self.mapper) as Arc<dyn DocumentMapper<T>>)
    }

    /// Query objects added as `S` and reconstruct them as `T`.
    pub fn query_static<S: ?Sized, T>(&self) -> TypedQuery<T>
    where
        T: Serialize + DeserializeOwned,
    {
        TypedQuery::new(
            Arc::clone(&self.mapper) as Arc<dyn DocumentMapper<T>>,
            self.executor(),
            TypeFilter::filter_for(&TypeIdentity::of::<S>(), TypeFilterKind::Static),
        )
    }

    /// Query objects whose actual type is `T` with an alternate mapper.
    pub fn query_with<T>(&self, mapper: Arc<dyn DocumentMapper<T>>) -> TypedQuery<T> {
        TypedQuery::new(
            mapper,
            self.executor(),
            TypeFilter::filter_for(&TypeIdentity::of::<T>(), TypeFilterKind::Actual),
        )
    }

    fn executor(&self) -> QueryExecutor {
        QueryExecutor::new(Arc::clone(&self.engine), self.config.executor.clone())
    }

    fn key_query<T: ?Sized>(&self, key: &Expr) -> Result<NativeQuery> {
        let filter = TypeFilter::filter_for(&TypeIdentity::of::<T>(), TypeFilterKind::Actual);
        Ok(self.translator.translate(key)?.intersect(filter))
    }
}
