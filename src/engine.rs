//! Boundary to the search engine.
//!
//! The mapping and query layers only talk to an engine through
//! [`SearchEngine`] (writes) and the short-lived [`Searcher`] leases it hands
//! out (reads). [`MemoryEngine`] is the in-process implementation.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::document::document::Document;
use crate::error::Result;
use crate::query::native::{NativeQuery, SortSpec};

pub mod analysis;
pub mod collector;
pub mod memory;

pub use self::memory::MemoryEngine;

/// Address of a live document inside an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocAddress(pub u64);

impl fmt::Display for DocAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Top hits of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopDocs {
    /// Number of documents matching query and filter, regardless of limit.
    pub total_hits: u64,
    /// Addresses of the top hits, in rank order.
    pub hits: Vec<DocAddress>,
}

/// A search engine that accepts documents and hands out searchers.
pub trait SearchEngine: Send + Sync + Debug {
    /// Add a document.
    fn write_document(&self, document: Document) -> Result<()>;

    /// Delete every document matching `query`; returns how many were removed.
    fn delete_by_query(&self, query: &NativeQuery) -> Result<u64>;

    /// Replace every document matching `query` with `document`.
    ///
    /// The default deletes then writes and is not atomic: if the write
    /// fails, the deleted documents are gone. Engines that can swap
    /// atomically should override it.
    fn replace_by_query(&self, query: &NativeQuery, document: Document) -> Result<u64> {
        let deleted = self.delete_by_query(query)?;
        self.write_document(document)?;
        Ok(deleted)
    }

    /// Acquire a searcher lease. The lease is released when dropped.
    fn searcher(&self) -> Result<Box<dyn Searcher + '_>>;
}

/// A point-in-time read view of the engine.
pub trait Searcher {
    /// Top `limit` hits of `query` intersected with the non-scoring
    /// `filter`, ordered by `sort`.
    fn search(
        &self,
        query: &NativeQuery,
        filter: Option<&NativeQuery>,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<TopDocs>;

    /// Number of documents matching `query` and `filter`.
    fn count(&self, query: &NativeQuery, filter: Option<&NativeQuery>) -> Result<u64>;

    /// Stored fields of a hit.
    fn doc(&self, address: DocAddress) -> Result<Document>;
}
