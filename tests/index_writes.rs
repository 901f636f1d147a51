//! Integration tests for writes, type filters, alternate mappers and engine
//! failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use docmap::config::IndexConfig;
use docmap::document::{Document, FieldOption, FieldValue};
use docmap::engine::{DocAddress, MemoryEngine, SearchEngine, Searcher, TopDocs};
use docmap::error::{DocmapError, Result};
use docmap::index::ObjectIndex;
use docmap::mapping::envelope::{ACTUAL_TYPE_FIELD, STATIC_TYPE_FIELD};
use docmap::mapping::{DocumentMapper, EnvelopeTypes, FieldConventions, FieldMapper, TypeEnvelope};
use docmap::query::expr::property;
use docmap::query::native::{NativeQuery, SortSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    id: i64,
    owner: String,
    balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ticket {
    id: uuid::Uuid,
    subject: String,
}

trait Shape {
    fn area(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Circle {
    radius: f64,
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Square {
    side: f64,
}

impl Shape for Square {
    fn area(&self) -> f64 {
        self.side * self.side
    }
}

fn account(id: i64, owner: &str, balance: f64) -> Account {
    Account {
        id,
        owner: owner.to_string(),
        balance,
    }
}

fn memory_index() -> (Arc<MemoryEngine>, ObjectIndex) {
    let engine = Arc::new(MemoryEngine::new());
    let index = ObjectIndex::new(engine.clone(), IndexConfig::default());
    (engine, index)
}

#[test]
fn test_round_trip_through_engine() -> Result<()> {
    let (_engine, index) = memory_index();
    let original = account(1, "Ada Lovelace", 12.5);
    index.add(&original)?;

    let restored = index.query::<Account>().to_vec()?;
    assert_eq!(restored, vec![original]);
    Ok(())
}

#[test]
fn test_update_replaces_matching_object() -> Result<()> {
    let (engine, index) = memory_index();
    index.add_all(&[account(1, "ann", 10.0), account(2, "bob", 20.0)])?;

    let id = property::<i64>("id");
    let replaced = index.update(id.term(2), &account(2, "bob", 25.0))?;
    assert_eq!(replaced, 1);
    assert_eq!(engine.len(), 2);

    let bob = index.query::<Account>().filter(id.term(2))?.first()?;
    assert_eq!(bob.map(|a| a.balance), Some(25.0));
    Ok(())
}

#[test]
fn test_update_by_exact_uuid_key() -> Result<()> {
    let mapper = FieldMapper::default()
        .with_conventions(FieldConventions::default().analyze_when(|path, _| path != "id"));
    let index = ObjectIndex::with_mapper(Arc::new(MemoryEngine::new()), IndexConfig::default(), mapper);

    let ticket = Ticket {
        id: uuid::Uuid::new_v4(),
        subject: "Printer on fire".into(),
    };
    index.add(&ticket)?;

    let id = property::<uuid::Uuid>("id");
    let updated = Ticket {
        subject: "Printer extinguished".into(),
        ..ticket.clone()
    };
    assert_eq!(index.update(id.term(ticket.id), &updated)?, 1);

    let tickets = index.query::<Ticket>().to_vec()?;
    assert_eq!(tickets, vec![updated]);
    Ok(())
}

#[test]
fn test_delete_is_restricted_to_type() -> Result<()> {
    #[derive(Serialize, Deserialize)]
    struct Other {
        id: i64,
    }

    let (engine, index) = memory_index();
    index.add(&account(7, "ann", 1.0))?;
    index.add(&Other { id: 7 })?;

    let id = property::<i64>("id");
    assert_eq!(index.delete::<Account, _>(id.term(7))?, 1);
    assert_eq!(engine.len(), 1);
    assert_eq!(index.query::<Other>().count()?, 1);

    assert_eq!(index.delete_all::<Other>()?, 1);
    assert!(engine.is_empty());
    Ok(())
}

#[test]
fn test_add_all_projects_before_writing() -> Result<()> {
    #[derive(Serialize)]
    struct Wide {
        value: u128,
    }

    let (engine, index) = memory_index();
    let result = index.add_all(&[Wide { value: 1 }, Wide { value: 2 }]);

    assert!(matches!(result, Err(DocmapError::UnsupportedType(_))));
    assert!(engine.is_empty());
    Ok(())
}

#[test]
fn test_static_and_actual_type_filters() -> Result<()> {
    let (_engine, index) = memory_index();
    index.add_as::<dyn Shape, _>(&Circle { radius: 1.0 })?;
    index.add_as::<dyn Shape, _>(&Square { side: 2.0 })?;
    index.add(&Square { side: 3.0 })?;

    assert_eq!(index.query::<Square>().count()?, 2);
    assert_eq!(index.query::<Circle>().count()?, 1);

    let shapes = index.query_static::<dyn Shape, serde_json::Value>().to_vec()?;
    assert_eq!(shapes.len(), 2);
    assert!(shapes.iter().any(|shape| shape.get("radius").is_some()));

    let squares_as_shapes = index.query_static::<Square, Square>().to_vec()?;
    assert_eq!(squares_as_shapes, vec![Square { side: 3.0 }]);
    assert_eq!(squares_as_shapes[0].area(), 9.0);
    Ok(())
}

#[test]
fn test_missing_source_fails_reconstruction_but_counts() -> Result<()> {
    let config = IndexConfig::builder().store_source(false).build();
    let index = ObjectIndex::new(Arc::new(MemoryEngine::new()), config);
    index.add(&account(1, "ann", 1.0))?;

    let query = index.query::<Account>();
    assert_eq!(query.count()?, 1);
    assert!(matches!(
        query.to_vec(),
        Err(DocmapError::MissingSourcePayload(_))
    ));

    let documents: Vec<Document> = query.documents().collect::<Result<_>>()?;
    assert_eq!(documents.len(), 1);
    assert!(TypeEnvelope::timestamp(&documents[0]).is_some());
    Ok(())
}

/// Stores the name in upper case and reads it back from stored fields.
#[derive(Debug)]
struct ShoutingMapper;

impl DocumentMapper<Account> for ShoutingMapper {
    fn to_document(&self, value: &Account, types: &EnvelopeTypes) -> Result<Document> {
        let stored = FieldOption::exact().with_stored(true);
        Ok(Document::builder()
            .add_field("id", FieldValue::Long(value.id), stored)
            .add_field("owner", FieldValue::String(value.owner.to_uppercase()), stored)
            .add_field("balance", FieldValue::Double(value.balance), stored)
            .add_field(
                ACTUAL_TYPE_FIELD,
                FieldValue::String(types.actual.to_string()),
                FieldOption::exact(),
            )
            .add_field(
                STATIC_TYPE_FIELD,
                FieldValue::String(types.static_type.to_string()),
                FieldOption::exact(),
            )
            .build())
    }

    fn to_object(&self, document: &Document) -> Result<Account> {
        let long = |name: &str| {
            document
                .get_field(name)
                .and_then(|f| f.value.as_long())
                .ok_or_else(|| DocmapError::corrupt_source(format!("missing {name}")))
        };
        Ok(Account {
            id: long("id")?,
            owner: document.get_str("owner").unwrap_or_default().to_string(),
            balance: document
                .get_field("balance")
                .and_then(|f| f.value.as_f64())
                .unwrap_or_default(),
        })
    }
}

#[test]
fn test_alternate_mapper() -> Result<()> {
    let (_engine, index) = memory_index();
    index.add_with(&ShoutingMapper, &account(3, "grace", 4.0))?;

    let owner = property::<String>("owner");
    let found = index
        .query_with::<Account>(Arc::new(ShoutingMapper))
        .filter(owner.term("GRACE"))?
        .to_vec()?;
    assert_eq!(found, vec![account(3, "GRACE", 4.0)]);
    Ok(())
}

/// Engine wrapper that can be told to fail searches.
#[derive(Debug, Default)]
struct FlakyEngine {
    inner: MemoryEngine,
    fail_lease: AtomicBool,
    fail_search: AtomicBool,
}

struct FlakySearcher<'a> {
    inner: Box<dyn Searcher + 'a>,
    fail_search: bool,
}

impl Searcher for FlakySearcher<'_> {
    fn search(
        &self,
        query: &NativeQuery,
        filter: Option<&NativeQuery>,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<TopDocs> {
        if self.fail_search {
            return Err(DocmapError::engine("search failed"));
        }
        self.inner.search(query, filter, sort, limit)
    }

    fn count(&self, query: &NativeQuery, filter: Option<&NativeQuery>) -> Result<u64> {
        if self.fail_search {
            return Err(DocmapError::engine("count failed"));
        }
        self.inner.count(query, filter)
    }

    fn doc(&self, address: DocAddress) -> Result<Document> {
        self.inner.doc(address)
    }
}

impl SearchEngine for FlakyEngine {
    fn write_document(&self, document: Document) -> Result<()> {
        self.inner.write_document(document)
    }

    fn delete_by_query(&self, query: &NativeQuery) -> Result<u64> {
        self.inner.delete_by_query(query)
    }

    fn searcher(&self) -> Result<Box<dyn Searcher + '_>> {
        if self.fail_lease.load(Ordering::SeqCst) {
            return Err(DocmapError::engine("no searcher available"));
        }
        Ok(Box::new(FlakySearcher {
            inner: self.inner.searcher()?,
            fail_search: self.fail_search.load(Ordering::SeqCst),
        }))
    }
}

#[test]
fn test_engine_failures_propagate_and_release_leases() -> Result<()> {
    let engine = Arc::new(FlakyEngine::default());
    let index = ObjectIndex::new(engine.clone(), IndexConfig::default());
    index.add_all(&[account(1, "ann", 1.0), account(2, "bob", 2.0)])?;

    engine.fail_search.store(true, Ordering::SeqCst);
    let query = index.query::<Account>();

    let err = query.count().unwrap_err();
    assert!(err.is_engine());
    assert_eq!(engine.inner.open_searchers(), 0);

    let mut results = query.iter();
    assert!(results.next().is_some_and(|r| r.is_err()));
    assert!(results.next().is_none());
    assert_eq!(engine.inner.open_searchers(), 0);

    engine.fail_search.store(false, Ordering::SeqCst);
    engine.fail_lease.store(true, Ordering::SeqCst);
    assert!(matches!(query.first(), Err(DocmapError::Engine(_))));

    engine.fail_lease.store(false, Ordering::SeqCst);
    assert_eq!(query.to_vec()?.len(), 2);
    Ok(())
}

#[test]
fn test_default_replace_is_delete_then_write() -> Result<()> {
    let engine = Arc::new(FlakyEngine::default());
    let index = ObjectIndex::new(engine.clone(), IndexConfig::default());
    index.add(&account(1, "ann", 1.0))?;

    let id = property::<i64>("id");
    assert_eq!(index.update(id.term(1), &account(1, "ann", 9.0))?, 1);
    assert_eq!(engine.inner.len(), 1);
    assert_eq!(
        index.query::<Account>().first()?.map(|a| a.balance),
        Some(9.0)
    );
    Ok(())
}
