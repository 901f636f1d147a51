//! Lazy, paged execution of query contexts.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::document::document::Document;
use crate::engine::SearchEngine;
use crate::error::Result;
use crate::query::context::{QueryContext, apply_paging};
use crate::query::native::{NativeQuery, SortSpec};

/// Executes [`QueryContext`]s against an engine.
///
/// The executor never caches a searcher: a lease is acquired for each batch
/// or count and dropped before control returns to the caller.
#[derive(Clone)]
pub struct QueryExecutor {
    engine: Arc<dyn SearchEngine>,
    config: ExecutorConfig,
}

impl fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("config", &self.config)
            .finish()
    }
}

impl QueryExecutor {
    /// Create a new executor.
    pub fn new(engine: Arc<dyn SearchEngine>, config: ExecutorConfig) -> Self {
        QueryExecutor { engine, config }
    }

    /// Get the executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Lazily enumerate matching documents.
    ///
    /// Nothing is fetched until the iterator is advanced. Every call starts
    /// a fresh traversal.
    pub fn enumerate(&self, context: &QueryContext, filter: Option<&NativeQuery>) -> DocumentIter {
        let skip = context.skip().unwrap_or(0);
        let mode = match context.take() {
            Some(take) => Mode::Bounded { take },
            None => Mode::Batched {
                batch_size: self.config.batch_size.max(1),
            },
        };
        log::debug!(
            "enumerating {} filtered by {} sorted by {}",
            context.predicate(),
            filter.map_or_else(|| "<none>".to_string(), ToString::to_string),
            context.sort()
        );

        DocumentIter {
            engine: Arc::clone(&self.engine),
            predicate: context.shared_predicate(),
            filter: filter.cloned(),
            sort: context.shared_sort(),
            mode,
            offset: skip,
            buffer: VecDeque::new(),
            finished: matches!(mode, Mode::Bounded { take: 0 }),
        }
    }

    /// Count matching documents with paging applied.
    ///
    /// Only the engine's hit count is used; no document is loaded.
    pub fn count(&self, context: &QueryContext, filter: Option<&NativeQuery>) -> Result<usize> {
        if context.take() == Some(0) {
            return Ok(0);
        }

        let total = {
            let searcher = self.engine.searcher()?;
            if context.sort().is_natural() {
                searcher.count(context.predicate(), filter)?
            } else {
                searcher
                    .search(context.predicate(), filter, context.sort(), 1)?
                    .total_hits
            }
        };

        let total = usize::try_from(total).unwrap_or(usize::MAX);
        let (start, end) = apply_paging(total, context.skip(), context.take());
        log::debug!("counted {total} hits for {}, {} after paging", context.predicate(), end - start);
        Ok(end - start)
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// One query for `skip + take` hits.
    Bounded { take: usize },
    /// Repeated queries growing by `batch_size`.
    Batched { batch_size: usize },
}

/// Lazy sequence of result documents.
///
/// Yields stored fields only. An engine failure is yielded once, after
/// which the sequence ends. Dropping the iterator cancels the enumeration.
pub struct DocumentIter {
    engine: Arc<dyn SearchEngine>,
    predicate: Arc<NativeQuery>,
    filter: Option<NativeQuery>,
    sort: Arc<SortSpec>,
    mode: Mode,
    /// Rank of the next hit to fetch.
    offset: usize,
    buffer: VecDeque<Document>,
    finished: bool,
}

impl fmt::Debug for DocumentIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIter")
            .field("predicate", &self.predicate)
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("mode", &self.mode)
            .field("offset", &self.offset)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl DocumentIter {
    fn fetch(&mut self) -> Result<()> {
        let (limit, bounded_take) = match self.mode {
            Mode::Bounded { take } => (self.offset.saturating_add(take), Some(take)),
            Mode::Batched { batch_size } => (self.offset.saturating_add(batch_size), None),
        };

        let searcher = self.engine.searcher()?;
        let top_docs =
            searcher.search(&self.predicate, self.filter.as_ref(), &self.sort, limit)?;

        let start = self.offset.min(top_docs.hits.len());
        let mut tail = &top_docs.hits[start..];
        if let Some(take) = bounded_take {
            tail = &tail[..take.min(tail.len())];
        }
        for address in tail {
            self.buffer.push_back(searcher.doc(*address)?);
        }
        drop(searcher);

        log::trace!(
            "fetched {} documents at offset {} of {} total hits",
            tail.len(),
            self.offset,
            top_docs.total_hits
        );

        self.offset += tail.len();
        self.finished = match self.mode {
            Mode::Bounded { .. } => true,
            Mode::Batched { batch_size } => tail.len() < batch_size,
        };
        Ok(())
    }
}

impl Iterator for DocumentIter {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(document) = self.buffer.pop_front() {
            return Some(Ok(document));
        }
        if self.finished {
            return None;
        }
        if let Err(err) = self.fetch() {
            self.finished = true;
            self.buffer.clear();
            return Some(Err(err));
        }
        self.buffer.pop_front().map(Ok)
    }
}
