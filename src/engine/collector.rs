//! Collectors gathering the top hits of a search.
//!
//! Documents are visited in address order. [`TopDocsCollector`] keeps the
//! first `max_docs` of them; [`TopFieldCollector`] keeps the best
//! `max_docs` by a multi-key sort, using a bounded heap so memory stays
//! proportional to the limit rather than to the number of matches.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::document::document::Document;
use crate::document::field::{FieldValue, SemanticType};
use crate::engine::DocAddress;
use crate::query::native::{SortKey, SortSpec};

/// Trait for collecting search results.
pub trait Collector: Send + Debug {
    /// Collect a matching document.
    fn collect(&mut self, address: DocAddress, document: &Document);

    /// Total number of documents collected so far.
    fn total_hits(&self) -> u64;

    /// Get the final hits in rank order.
    fn into_hits(self) -> Vec<DocAddress>;
}

/// Keeps the first `max_docs` documents in natural order.
#[derive(Debug)]
pub struct TopDocsCollector {
    max_docs: usize,
    hits: Vec<DocAddress>,
    total_hits: u64,
}

impl TopDocsCollector {
    /// Create a new top docs collector.
    pub fn new(max_docs: usize) -> Self {
        TopDocsCollector {
            max_docs,
            hits: Vec::with_capacity(max_docs.min(1024)),
            total_hits: 0,
        }
    }
}

impl Collector for TopDocsCollector {
    fn collect(&mut self, address: DocAddress, _document: &Document) {
        self.total_hits += 1;
        if self.hits.len() < self.max_docs {
            self.hits.push(address);
        }
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn into_hits(self) -> Vec<DocAddress> {
        self.hits
    }
}

/// A document with its sort values, ordered by rank.
#[derive(Debug)]
struct FieldSortedDoc {
    address: DocAddress,
    values: Vec<SortValue>,
    descending: Arc<[bool]>,
}

impl PartialEq for FieldSortedDoc {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FieldSortedDoc {}

impl PartialOrd for FieldSortedDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldSortedDoc {
    // Less means ranked earlier, so the heap's max is the worst kept hit.
    fn cmp(&self, other: &Self) -> Ordering {
        for ((a, b), descending) in self
            .values
            .iter()
            .zip(other.values.iter())
            .zip(self.descending.iter())
        {
            let ordering = a.cmp(b);
            let ordering = if *descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.address.cmp(&other.address)
    }
}

/// Keeps the best `max_docs` documents by a list of sort keys.
///
/// Each key reads the first value of its field and coerces it to the key's
/// semantic type: Long keys compare as integers, Float and Double keys as
/// floats, String keys lexically. Missing or uncoercible values sort lowest.
/// Ties on every key fall back to address order.
#[derive(Debug)]
pub struct TopFieldCollector {
    max_docs: usize,
    keys: Vec<SortKey>,
    descending: Arc<[bool]>,
    hits: BinaryHeap<FieldSortedDoc>,
    total_hits: u64,
}

impl TopFieldCollector {
    /// Create a new top field collector.
    pub fn new(max_docs: usize, sort: &SortSpec) -> Self {
        let keys = sort.keys().to_vec();
        let descending = keys.iter().map(|key| key.descending).collect();
        TopFieldCollector {
            max_docs,
            keys,
            descending,
            hits: BinaryHeap::new(),
            total_hits: 0,
        }
    }
}

impl Collector for TopFieldCollector {
    fn collect(&mut self, address: DocAddress, document: &Document) {
        self.total_hits += 1;
        if self.max_docs == 0 {
            return;
        }

        let candidate = FieldSortedDoc {
            address,
            values: self
                .keys
                .iter()
                .map(|key| SortValue::coerce(key.kind, document.values(&key.field).next()))
                .collect(),
            descending: Arc::clone(&self.descending),
        };

        if self.hits.len() < self.max_docs {
            self.hits.push(candidate);
        } else if let Some(worst) = self.hits.peek()
            && candidate < *worst
        {
            self.hits.pop();
            self.hits.push(candidate);
        }
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn into_hits(self) -> Vec<DocAddress> {
        self.hits
            .into_sorted_vec()
            .into_iter()
            .map(|doc| doc.address)
            .collect()
    }
}

/// A field value coerced to the comparison family of a sort key.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Missing,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SortValue {
    fn coerce(kind: SemanticType, value: Option<&FieldValue>) -> SortValue {
        let Some(value) = value else {
            return SortValue::Missing;
        };
        let coerced = match kind {
            SemanticType::Long => match value {
                FieldValue::Long(v) => Some(*v),
                FieldValue::Float(_) | FieldValue::Double(_) => value.as_f64().map(|v| v as i64),
                FieldValue::String(s) => s.parse().ok(),
            }
            .map(SortValue::Integer),
            SemanticType::Float | SemanticType::Double => match value {
                FieldValue::String(s) => s.parse().ok(),
                numeric => numeric.as_f64(),
            }
            .map(SortValue::Real),
            SemanticType::String => Some(SortValue::Text(value.to_string())),
        };
        coerced.unwrap_or(SortValue::Missing)
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Missing => 0,
            SortValue::Integer(_) => 1,
            SortValue::Real(_) => 2,
            SortValue::Text(_) => 3,
        }
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Integer(a), SortValue::Integer(b)) => a.cmp(b),
            (SortValue::Real(a), SortValue::Real(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            // Values of one key share a family; only Missing crosses over.
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(n: i64, name: &str) -> Document {
        Document::builder()
            .add_long("n", n)
            .add_string("name", name)
            .build()
    }

    fn key(field: &str, kind: SemanticType, descending: bool) -> SortKey {
        SortKey {
            field: field.into(),
            kind,
            descending,
        }
    }

    #[test]
    fn test_top_docs_keeps_first() {
        let mut collector = TopDocsCollector::new(2);
        for i in 0..5 {
            collector.collect(DocAddress(i), &doc(i as i64, "x"));
        }
        assert_eq!(collector.total_hits(), 5);
        assert_eq!(collector.into_hits(), vec![DocAddress(0), DocAddress(1)]);
    }

    #[test]
    fn test_top_field_descending() {
        let sort = SortSpec::by(key("n", SemanticType::Long, true));
        let mut collector = TopFieldCollector::new(3, &sort);
        for (i, n) in [4, 9, 1, 7, 3].into_iter().enumerate() {
            collector.collect(DocAddress(i as u64), &doc(n, "x"));
        }
        assert_eq!(collector.total_hits(), 5);
        assert_eq!(
            collector.into_hits(),
            vec![DocAddress(1), DocAddress(3), DocAddress(0)]
        );
    }

    #[test]
    fn test_top_field_multi_key_and_ties() {
        let mut sort = SortSpec::by(key("name", SemanticType::String, false));
        sort.push(key("n", SemanticType::Long, true));
        let mut collector = TopFieldCollector::new(10, &sort);

        collector.collect(DocAddress(0), &doc(1, "b"));
        collector.collect(DocAddress(1), &doc(5, "a"));
        collector.collect(DocAddress(2), &doc(2, "b"));
        collector.collect(DocAddress(3), &doc(5, "a"));
        collector.collect(DocAddress(4), &Document::new());

        assert_eq!(
            collector.into_hits(),
            vec![
                DocAddress(4),
                DocAddress(1),
                DocAddress(3),
                DocAddress(2),
                DocAddress(0),
            ]
        );
    }

    #[test]
    fn test_key_kind_selects_comparator() {
        let docs = [doc(9, "x"), doc(10, "x"), doc(-1, "x")];

        let numeric = SortSpec::by(key("n", SemanticType::Long, false));
        let mut collector = TopFieldCollector::new(10, &numeric);
        for (i, d) in docs.iter().enumerate() {
            collector.collect(DocAddress(i as u64), d);
        }
        assert_eq!(
            collector.into_hits(),
            vec![DocAddress(2), DocAddress(0), DocAddress(1)]
        );

        let lexical = SortSpec::by(key("n", SemanticType::String, false));
        let mut collector = TopFieldCollector::new(10, &lexical);
        for (i, d) in docs.iter().enumerate() {
            collector.collect(DocAddress(i as u64), d);
        }
        assert_eq!(
            collector.into_hits(),
            vec![DocAddress(2), DocAddress(1), DocAddress(0)]
        );
    }

    #[test]
    fn test_sort_value_coercion() {
        let long = FieldValue::Long(3);
        let double = FieldValue::Double(2.5);
        let text = FieldValue::String("12".into());

        assert_eq!(SortValue::coerce(SemanticType::Long, Some(&double)), SortValue::Integer(2));
        assert_eq!(SortValue::coerce(SemanticType::Long, Some(&text)), SortValue::Integer(12));
        assert_eq!(SortValue::coerce(SemanticType::Double, Some(&long)), SortValue::Real(3.0));
        assert_eq!(
            SortValue::coerce(SemanticType::String, Some(&long)),
            SortValue::Text("3".into())
        );
        assert_eq!(
            SortValue::coerce(SemanticType::Long, Some(&FieldValue::String("abc".into()))),
            SortValue::Missing
        );
        assert!(SortValue::Missing < SortValue::Integer(i64::MIN));
    }
}
