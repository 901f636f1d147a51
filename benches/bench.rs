//! Criterion benchmarks for docmap.
//!
//! Covers the hot paths of the mapping and query layers:
//! - Projection of objects into documents and reconstruction
//! - Predicate translation
//! - Sorted, paged execution against the in-memory engine

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use docmap::config::IndexConfig;
use docmap::engine::MemoryEngine;
use docmap::index::ObjectIndex;
use docmap::mapping::{EnvelopeTypes, FieldMapper};
use docmap::query::expr::{and, object, property};
use docmap::query::translator::QueryTranslator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Address {
    city: String,
    zip: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Customer {
    id: i64,
    name: String,
    score: f64,
    tags: Vec<String>,
    address: Address,
    note: Option<String>,
}

/// Generate test customers for benchmarking.
fn generate_customers(count: usize) -> Vec<Customer> {
    let words = [
        "gold", "silver", "bronze", "new", "returning", "churned", "vip", "trial",
    ];
    let cities = ["Tokyo", "Osaka", "Berlin", "Lisbon", "Austin"];

    (0..count)
        .map(|i| Customer {
            id: i as i64,
            name: format!("Customer number {i}"),
            score: ((i * 37) % 1000) as f64 / 10.0,
            tags: (0..(i % 4) + 1)
                .map(|j| words[(i * 7 + j * 13) % words.len()].to_string())
                .collect(),
            address: Address {
                city: cities[i % cities.len()].to_string(),
                zip: (10_000 + i % 90_000) as u32,
            },
            note: (i % 3 == 0).then(|| "prefers email".to_string()),
        })
        .collect()
}

fn bench_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapping");
    let mapper = FieldMapper::default();
    let customers = generate_customers(100);
    let types = EnvelopeTypes::of::<Customer>();

    group.bench_function("project_single", |b| {
        b.iter(|| black_box(mapper.to_document(black_box(&customers[0]), &types)))
    });

    group.throughput(Throughput::Elements(customers.len() as u64));
    group.bench_function("project_batch", |b| {
        b.iter(|| {
            for customer in &customers {
                let _ = black_box(mapper.to_document(black_box(customer), &types));
            }
        })
    });

    let documents: Vec<_> = customers
        .iter()
        .map(|customer| mapper.to_document(customer, &types))
        .collect::<Result<_, _>>()
        .unwrap();
    group.bench_function("reconstruct_batch", |b| {
        b.iter(|| {
            for document in &documents {
                let _ = black_box(mapper.reconstruct::<Customer>(black_box(document)));
            }
        })
    });

    group.finish();
}

fn bench_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("translation");
    let translator = QueryTranslator::new();

    let score = property::<f64>("score");
    let city = object("address").property::<String>("city");
    let tags = property::<Vec<String>>("tags");
    let predicate = and([
        score.between(10.0, 90.0),
        city.term("tokyo"),
        tags.term("vip"),
    ]);

    group.bench_function("translate_conjunction", |b| {
        b.iter(|| black_box(translator.translate(black_box(&predicate))))
    });

    group.finish();
}

fn bench_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution");
    let customers = generate_customers(5_000);
    let index = ObjectIndex::new(
        Arc::new(MemoryEngine::new()),
        IndexConfig::builder().batch_size(500).build(),
    );
    index.add_all(&customers).unwrap();

    let score = property::<f64>("score");
    let city = object("address").property::<String>("city");

    group.bench_function("count_filtered", |b| {
        let query = index
            .query::<Customer>()
            .filter(city.term("berlin"))
            .unwrap();
        b.iter(|| black_box(query.count()))
    });

    group.throughput(Throughput::Elements(20));
    group.bench_function("sorted_page", |b| {
        let query = index
            .query::<Customer>()
            .filter(score.at_least(25.0))
            .unwrap()
            .order_by_descending(&score)
            .unwrap()
            .skip(100)
            .take(20);
        b.iter(|| black_box(query.to_vec()))
    });

    group.bench_function("enumerate_batched", |b| {
        let query = index.query::<Customer>();
        b.iter(|| black_box(query.documents().count()))
    });

    group.finish();
}

criterion_group!(benches, bench_mapping, bench_translation, bench_execution);
criterion_main!(benches);
