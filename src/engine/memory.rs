//! In-process search engine.
//!
//! Keeps every document in memory and evaluates queries by scanning live
//! documents in insertion order. Analyzed string fields are pre-tokenized
//! at write time. Useful for tests and for small embedded indexes.

use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::{AHashMap, AHashSet};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::document::document::Document;
use crate::document::field::FieldValue;
use crate::engine::analysis::WordAnalyzer;
use crate::engine::collector::{Collector, TopDocsCollector, TopFieldCollector};
use crate::engine::{DocAddress, SearchEngine, Searcher, TopDocs};
use crate::error::{DocmapError, Result};
use crate::query::native::{NativeQuery, SortSpec};

/// A document together with its analyzed terms.
#[derive(Debug)]
struct IndexedDocument {
    document: Document,
    /// Terms of analyzed fields, by field name.
    terms: AHashMap<String, AHashSet<String>>,
}

impl IndexedDocument {
    fn new(document: Document, analyzer: &WordAnalyzer) -> Self {
        let mut terms: AHashMap<String, AHashSet<String>> = AHashMap::new();
        for field in document.fields() {
            if !(field.option.indexed && field.option.analyzed) {
                continue;
            }
            if let FieldValue::String(text) = &field.value {
                terms
                    .entry(field.name.clone())
                    .or_default()
                    .extend(analyzer.analyze(text));
            }
        }
        IndexedDocument { document, terms }
    }

    fn matches(&self, query: &NativeQuery) -> bool {
        match query {
            NativeQuery::MatchAll => true,
            NativeQuery::Term { field, term } => {
                let exact = self.document.get_fields(field).any(|f| {
                    f.option.indexed && !f.option.analyzed && f.value.as_str() == Some(term.as_str())
                });
                exact
                    || self
                        .terms
                        .get(field)
                        .is_some_and(|terms| terms.contains(term))
            }
            NativeQuery::NumericRange(range) => self
                .document
                .get_fields(&range.field)
                .any(|f| f.option.indexed && range.contains(&f.value)),
            NativeQuery::Intersection(clauses) => clauses.iter().all(|clause| self.matches(clause)),
        }
    }
}

#[derive(Debug, Default)]
struct Segment {
    /// Documents by address; deleted slots are `None`.
    docs: Vec<Option<IndexedDocument>>,
    live: usize,
}

impl Segment {
    fn push(&mut self, document: IndexedDocument) {
        self.docs.push(Some(document));
        self.live += 1;
        log::trace!("wrote document {}", self.docs.len() - 1);
    }

    fn delete(&mut self, query: &NativeQuery) -> u64 {
        let mut deleted = 0;
        for slot in self.docs.iter_mut() {
            if slot.as_ref().is_some_and(|doc| doc.matches(query)) {
                *slot = None;
                deleted += 1;
            }
        }
        self.live -= deleted;
        log::trace!("deleted {deleted} documents matching {query}");
        deleted as u64
    }

    fn matching<'a>(
        &'a self,
        query: &'a NativeQuery,
        filter: Option<&'a NativeQuery>,
    ) -> impl Iterator<Item = (DocAddress, &'a IndexedDocument)> + 'a {
        self.docs.iter().enumerate().filter_map(move |(id, slot)| {
            let doc = slot.as_ref()?;
            let filtered = filter.is_none_or(|filter| doc.matches(filter));
            (filtered && doc.matches(query)).then_some((DocAddress(id as u64), doc))
        })
    }
}

/// In-memory [`SearchEngine`].
///
/// # Example
///
/// ```
/// use docmap::document::Document;
/// use docmap::engine::{MemoryEngine, SearchEngine};
/// use docmap::query::native::{NativeQuery, SortSpec};
///
/// let engine = MemoryEngine::new();
/// engine
///     .write_document(Document::builder().add_string("name", "test").build())
///     .unwrap();
///
/// let searcher = engine.searcher().unwrap();
/// let hits = searcher
///     .search(&NativeQuery::term("name", "test"), None, &SortSpec::natural(), 10)
///     .unwrap();
/// assert_eq!(hits.total_hits, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    segment: RwLock<Segment>,
    analyzer: WordAnalyzer,
    open_searchers: AtomicUsize,
    searches: AtomicUsize,
}

impl MemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, document: Document) -> Result<IndexedDocument> {
        if document.is_empty() {
            return Err(DocmapError::invalid_argument("cannot write an empty document"));
        }
        Ok(IndexedDocument::new(document, &self.analyzer))
    }

    /// Number of live documents.
    pub fn len(&self) -> usize {
        self.segment.read().live
    }

    /// Whether the engine holds no live documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of searcher leases currently held.
    pub fn open_searchers(&self) -> usize {
        self.open_searchers.load(Ordering::SeqCst)
    }

    /// Number of `search` calls served so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl SearchEngine for MemoryEngine {
    fn write_document(&self, document: Document) -> Result<()> {
        let indexed = self.index(document)?;
        self.segment.write().push(indexed);
        Ok(())
    }

    fn delete_by_query(&self, query: &NativeQuery) -> Result<u64> {
        Ok(self.segment.write().delete(query))
    }

    /// Atomic: readers see either the old documents or the new one.
    fn replace_by_query(&self, query: &NativeQuery, document: Document) -> Result<u64> {
        let indexed = self.index(document)?;
        let mut segment = self.segment.write();
        let deleted = segment.delete(query);
        segment.push(indexed);
        Ok(deleted)
    }

    fn searcher(&self) -> Result<Box<dyn Searcher + '_>> {
        let segment = self.segment.read();
        self.open_searchers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySearcher {
            segment,
            engine: self,
        }))
    }
}

/// Searcher lease over a [`MemoryEngine`]. Holds the read lock until dropped.
struct MemorySearcher<'a> {
    segment: RwLockReadGuard<'a, Segment>,
    engine: &'a MemoryEngine,
}

impl Searcher for MemorySearcher<'_> {
    fn search(
        &self,
        query: &NativeQuery,
        filter: Option<&NativeQuery>,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<TopDocs> {
        self.engine.searches.fetch_add(1, Ordering::SeqCst);

        let matching = self.segment.matching(query, filter);
        let top_docs = if sort.is_natural() {
            collect(TopDocsCollector::new(limit), matching)
        } else {
            collect(TopFieldCollector::new(limit, sort), matching)
        };
        Ok(top_docs)
    }

    fn count(&self, query: &NativeQuery, filter: Option<&NativeQuery>) -> Result<u64> {
        Ok(self.segment.matching(query, filter).count() as u64)
    }

    fn doc(&self, address: DocAddress) -> Result<Document> {
        self.segment
            .docs
            .get(address.0 as usize)
            .and_then(Option::as_ref)
            .map(|doc| doc.document.stored())
            .ok_or_else(|| DocmapError::engine(format!("{address} does not exist")))
    }
}

impl Drop for MemorySearcher<'_> {
    fn drop(&mut self) {
        self.engine.open_searchers.fetch_sub(1, Ordering::SeqCst);
    }
}

fn collect<'a, C: Collector>(
    mut collector: C,
    matching: impl Iterator<Item = (DocAddress, &'a IndexedDocument)>,
) -> TopDocs {
    for (address, doc) in matching {
        collector.collect(address, &doc.document);
    }
    TopDocs {
        total_hits: collector.total_hits(),
        hits: collector.into_hits(),
    }
}
