//! Benchmarks for factview-indexer using criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use factview_core::{Fact, Value};
use factview_indexer::Indexer;
use factview_query::{field, Term};

fn people(size: i64) -> Vec<Fact> {
    (0..size)
        .map(|i| Fact::new(vec![Value::from(format!("p{}", i)), Value::Int64(i % 90)]))
        .collect()
}

fn with_view() -> Indexer {
    let mut indexer = Indexer::new();
    indexer.add_table("people", &["name", "age"]).unwrap();
    let adults = indexer
        .query("adults")
        .select("people", vec![])
        .calculate(">=", vec![("a", field(0, "age")), ("b", Term::from(18i64))])
        .project(vec![("name", field(0, "name"))]);
    indexer.as_view(adults).unwrap();
    indexer
}

fn apply_diff_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_diff");

    for size in [100, 1000, 5000].iter() {
        let input = people(*size);
        group.bench_with_input(BenchmarkId::new("no_view", size), &input, |b, input| {
            b.iter(|| {
                let mut indexer = Indexer::new();
                let mut diff = indexer.diff();
                diff.add_many("people", input.iter().cloned());
                black_box(indexer.apply_diff(&diff).unwrap())
            });
        });
        group.bench_with_input(BenchmarkId::new("with_view", size), &input, |b, input| {
            b.iter(|| {
                let mut indexer = with_view();
                let mut diff = indexer.diff();
                diff.add_many("people", input.iter().cloned());
                black_box(indexer.apply_diff(&diff).unwrap())
            });
        });
    }

    group.finish();
}

fn single_change_benchmark(c: &mut Criterion) {
    let mut indexer = with_view();
    let mut diff = indexer.diff();
    diff.add_many("people", people(5000));
    indexer.apply_diff(&diff).unwrap();

    let newcomer = Fact::new(vec![Value::from("newcomer"), Value::Int64(40)]);
    c.bench_function("toggle_one_fact", |b| {
        b.iter(|| {
            let mut add = indexer.diff();
            add.add("people", newcomer.clone());
            indexer.apply_diff(&add).unwrap();
            let mut remove = indexer.diff();
            remove.remove("people", newcomer.clone());
            black_box(indexer.apply_diff(&remove).unwrap())
        });
    });
}

criterion_group!(benches, apply_diff_benchmark, single_change_benchmark);
criterion_main!(benches);
