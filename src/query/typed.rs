//! Fluent typed queries.

use std::fmt;
use std::sync::Arc;

use crate::document::document::Document;
use crate::error::Result;
use crate::mapping::mapper::DocumentMapper;
use crate::query::context::QueryContext;
use crate::query::executor::{DocumentIter, QueryExecutor};
use crate::query::expr::Expr;
use crate::query::native::NativeQuery;
use crate::query::sort::SortResolver;
use crate::query::translator::QueryTranslator;

/// A query over objects of type `T`.
///
/// Every refinement consumes the query and returns the refined one; use
/// [`branch`](TypedQuery::branch) (or `clone`) to fork a query before
/// refining it. Results are restricted to documents matching the type
/// filter the query was created with.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use docmap::config::IndexConfig;
/// use docmap::engine::MemoryEngine;
/// use docmap::index::ObjectIndex;
/// use docmap::query::expr::property;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Item {
///     number: i32,
/// }
///
/// let index = ObjectIndex::new(Arc::new(MemoryEngine::new()), IndexConfig::default());
/// for number in 0..10 {
///     index.add(&Item { number }).unwrap();
/// }
///
/// let number = property::<i32>("number");
/// let items = index
///     .query::<Item>()
///     .filter(number.between(2, 8))
///     .unwrap()
///     .order_by_descending(&number)
///     .unwrap()
///     .take(3)
///     .to_vec()
///     .unwrap();
///
/// let numbers: Vec<i32> = items.iter().map(|item| item.number).collect();
/// assert_eq!(numbers, vec![8, 7, 6]);
/// ```
pub struct TypedQuery<T> {
    mapper: Arc<dyn DocumentMapper<T>>,
    executor: QueryExecutor,
    type_filter: Arc<NativeQuery>,
    context: QueryContext,
    translator: QueryTranslator,
    sorts: SortResolver,
}

impl<T> TypedQuery<T> {
    /// Create a query restricted by `type_filter`.
    pub fn new(
        mapper: Arc<dyn DocumentMapper<T>>,
        executor: QueryExecutor,
        type_filter: NativeQuery,
    ) -> Self {
        TypedQuery {
            mapper,
            executor,
            type_filter: Arc::new(type_filter),
            context: QueryContext::new(),
            translator: QueryTranslator::new(),
            sorts: SortResolver::new(),
        }
    }

    /// The accumulated context.
    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// The type restriction applied to every execution.
    pub fn type_filter(&self) -> &NativeQuery {
        &self.type_filter
    }

    /// Set the predicate, replacing any previous one.
    pub fn filter<P: Into<Expr>>(mut self, predicate: P) -> Result<Self> {
        let query = self.translator.translate(&predicate.into())?;
        self.context.set_predicate(query);
        Ok(self)
    }

    /// Order ascending by `selector`, discarding earlier keys.
    pub fn order_by<S: Into<Expr>>(self, selector: S) -> Result<Self> {
        self.primary_key(selector.into(), false)
    }

    /// Order descending by `selector`, discarding earlier keys.
    pub fn order_by_descending<S: Into<Expr>>(self, selector: S) -> Result<Self> {
        self.primary_key(selector.into(), true)
    }

    /// Add an ascending secondary key.
    pub fn then_by<S: Into<Expr>>(self, selector: S) -> Result<Self> {
        self.secondary_key(selector.into(), false)
    }

    /// Add a descending secondary key.
    pub fn then_by_descending<S: Into<Expr>>(self, selector: S) -> Result<Self> {
        self.secondary_key(selector.into(), true)
    }

    fn primary_key(mut self, selector: Expr, descending: bool) -> Result<Self> {
        let key = self.sorts.resolve(&selector, descending)?;
        self.context.order_by(key);
        Ok(self)
    }

    fn secondary_key(mut self, selector: Expr, descending: bool) -> Result<Self> {
        let key = self.sorts.resolve(&selector, descending)?;
        self.context.then_by(key);
        Ok(self)
    }

    /// Skip the first `n` results.
    pub fn skip(mut self, n: usize) -> Self {
        self.context.set_skip(n);
        self
    }

    /// Return at most `n` results.
    pub fn take(mut self, n: usize) -> Self {
        self.context.set_take(n);
        self
    }

    /// Lazily enumerate the raw result documents.
    pub fn documents(&self) -> DocumentIter {
        self.executor
            .enumerate(&self.context, Some(&self.type_filter))
    }

    /// Lazily enumerate the results.
    pub fn iter(&self) -> Results<T> {
        Results {
            documents: self.documents(),
            mapper: Arc::clone(&self.mapper),
        }
    }

    /// Collect all results.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }

    /// The first result, if any.
    pub fn first(&self) -> Result<Option<T>> {
        let mut context = self.context.branch();
        context.set_take(self.context.take().map_or(1, |take| take.min(1)));

        let mut documents = self.executor.enumerate(&context, Some(&self.type_filter));
        documents
            .next()
            .transpose()?
            .map(|document| self.mapper.to_object(&document))
            .transpose()
    }

    /// Number of results, paging applied. No document is loaded.
    pub fn count(&self) -> Result<usize> {
        self.executor.count(&self.context, Some(&self.type_filter))
    }

    /// Independent copy of this query.
    pub fn branch(&self) -> Self {
        TypedQuery {
            mapper: Arc::clone(&self.mapper),
            executor: self.executor.clone(),
            type_filter: Arc::clone(&self.type_filter),
            context: self.context.branch(),
            translator: self.translator,
            sorts: self.sorts,
        }
    }
}

impl<T> Clone for TypedQuery<T> {
    fn clone(&self) -> Self {
        self.branch()
    }
}

impl<T> fmt::Debug for TypedQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedQuery")
            .field("mapper", &self.mapper)
            .field("type_filter", &self.type_filter)
            .field("context", &self.context)
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a TypedQuery<T> {
    type Item = Result<T>;
    type IntoIter = Results<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy sequence of reconstructed results.
pub struct Results<T> {
    documents: DocumentIter,
    mapper: Arc<dyn DocumentMapper<T>>,
}

impl<T> Iterator for Results<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let document: Result<Document> = self.documents.next()?;
        Some(document.and_then(|document| self.mapper.to_object(&document)))
    }
}

impl<T> fmt::Debug for Results<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Results")
            .field("documents", &self.documents)
            .finish()
    }
}
