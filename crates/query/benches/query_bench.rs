//! Benchmarks for factview-query using criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use factview_core::{Fact, Value};
use factview_query::{field, FunctionRegistry, Query, Term};
use factview_storage::Table;
use std::collections::BTreeMap;

fn catalog(size: i64) -> BTreeMap<String, Table> {
    let mut people = Table::with_fields("people", vec!["id".into(), "age".into(), "team".into()]);
    let facts: Vec<Fact> = (0..size)
        .map(|i| Fact::new(vec![Value::Int64(i), Value::Int64(i % 90), Value::Int64(i % 10)]))
        .collect();
    people.update(&facts, &[]).unwrap();

    let mut teams = Table::with_fields("teams", vec!["team".into(), "name".into()]);
    let facts: Vec<Fact> = (0..10)
        .map(|i| Fact::new(vec![Value::Int64(i), Value::from("team")]))
        .collect();
    teams.update(&facts, &[]).unwrap();

    let mut tables = BTreeMap::new();
    tables.insert("people".to_string(), people);
    tables.insert("teams".to_string(), teams);
    tables
}

fn filter_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_project");
    let functions = FunctionRegistry::with_builtins();

    for size in [1000, 10000].iter() {
        let mut tables = catalog(*size);
        let mut query = Query::new()
            .select("people", vec![])
            .calculate(">", vec![("a", field(0, "age")), ("b", Term::from(18i64))])
            .project(vec![("id", field(0, "id"))]);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(query.exec(&functions, &mut tables).unwrap()));
        });
    }

    group.finish();
}

fn join_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexed_join");
    let functions = FunctionRegistry::with_builtins();

    for size in [1000, 10000].iter() {
        let mut tables = catalog(*size);
        let mut query = Query::new()
            .select("people", vec![])
            .select("teams", vec![("team", field(0, "team"))])
            .project(vec![("id", field(0, "id")), ("name", field(1, "name"))]);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(query.exec(&functions, &mut tables).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, filter_benchmark, join_benchmark);
criterion_main!(benches);
