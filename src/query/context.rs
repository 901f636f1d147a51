//! Accumulated state of a query under construction.

use std::sync::{Arc, LazyLock};

use crate::query::native::{NativeQuery, SortKey, SortSpec};

static MATCH_ALL: LazyLock<Arc<NativeQuery>> = LazyLock::new(|| Arc::new(NativeQuery::MatchAll));
static NATURAL: LazyLock<Arc<SortSpec>> = LazyLock::new(|| Arc::new(SortSpec::natural()));

/// Progress of a context.
///
/// Each state is reached by setting the corresponding part; a later part
/// may be set without the earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContextState {
    /// Nothing set; match everything in natural order.
    Fresh,
    /// A predicate has been set.
    PredicateSet,
    /// At least one sort key has been set.
    Sorted,
    /// Skip or take has been set.
    Paged,
}

/// Predicate, ordering and paging of a query.
///
/// The neutral predicate and order are process-wide shared instances.
/// [`branch`](QueryContext::branch) gives a fresh copy of anything that is
/// not neutral, so refinements of the branch never leak into the original.
#[derive(Debug)]
pub struct QueryContext {
    predicate: Arc<NativeQuery>,
    sort: Arc<SortSpec>,
    skip: Option<usize>,
    take: Option<usize>,
}

impl QueryContext {
    /// Create a fresh context.
    pub fn new() -> Self {
        QueryContext {
            predicate: Arc::clone(&MATCH_ALL),
            sort: Arc::clone(&NATURAL),
            skip: None,
            take: None,
        }
    }

    /// The current predicate.
    pub fn predicate(&self) -> &NativeQuery {
        &self.predicate
    }

    /// The current ordering.
    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub(crate) fn shared_predicate(&self) -> Arc<NativeQuery> {
        Arc::clone(&self.predicate)
    }

    pub(crate) fn shared_sort(&self) -> Arc<SortSpec> {
        Arc::clone(&self.sort)
    }

    /// Number of results to skip, if set.
    pub fn skip(&self) -> Option<usize> {
        self.skip
    }

    /// Maximum number of results, if set.
    pub fn take(&self) -> Option<usize> {
        self.take
    }

    /// Replace the predicate.
    pub fn set_predicate(&mut self, predicate: NativeQuery) {
        self.predicate = if predicate.is_match_all() {
            Arc::clone(&MATCH_ALL)
        } else {
            Arc::new(predicate)
        };
    }

    /// Replace the ordering with a single primary key.
    pub fn order_by(&mut self, key: SortKey) {
        self.sort = Arc::new(SortSpec::by(key));
    }

    /// Append a secondary key. Without a primary key this behaves like
    /// [`order_by`](QueryContext::order_by).
    pub fn then_by(&mut self, key: SortKey) {
        Arc::make_mut(&mut self.sort).push(key);
    }

    /// Set the number of results to skip.
    pub fn set_skip(&mut self, skip: usize) {
        self.skip = Some(skip);
    }

    /// Set the maximum number of results.
    pub fn set_take(&mut self, take: usize) {
        self.take = Some(take);
    }

    /// How far this context has progressed.
    pub fn state(&self) -> ContextState {
        if self.skip.is_some() || self.take.is_some() {
            ContextState::Paged
        } else if !self.sort.is_natural() {
            ContextState::Sorted
        } else if !self.predicate.is_match_all() {
            ContextState::PredicateSet
        } else {
            ContextState::Fresh
        }
    }

    /// Independent copy of this context.
    pub fn branch(&self) -> QueryContext {
        let predicate = if self.predicate.is_match_all() {
            Arc::clone(&MATCH_ALL)
        } else {
            Arc::new(NativeQuery::clone(&self.predicate))
        };
        let sort = if self.sort.is_natural() {
            Arc::clone(&NATURAL)
        } else {
            Arc::new(SortSpec::clone(&self.sort))
        };

        QueryContext {
            predicate,
            sort,
            skip: self.skip,
            take: self.take,
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QueryContext {
    fn clone(&self) -> Self {
        self.branch()
    }
}

/// Window of `total` results selected by `skip` and `take`.
///
/// Returns `(start, end)` with `start <= end <= total`.
pub fn apply_paging(total: usize, skip: Option<usize>, take: Option<usize>) -> (usize, usize) {
    let start = skip.unwrap_or(0).min(total);
    let end = match take {
        Some(take) => start.saturating_add(take).min(total),
        None => total,
    };
    (start, end)
}
