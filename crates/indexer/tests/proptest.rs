//! Property-based tests for factview-indexer using proptest.

use factview_core::{Fact, Value};
use factview_indexer::Indexer;
use factview_query::{field, Term};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn fact_strategy() -> impl Strategy<Value = Fact> {
    (0i64..5, 0i64..5).prop_map(|(a, b)| Fact::new(vec![Value::Int64(a), Value::Int64(b)]))
}

fn batch_strategy() -> impl Strategy<Value = (Vec<Fact>, Vec<Fact>)> {
    (
        prop::collection::vec(fact_strategy(), 0..6),
        prop::collection::vec(fact_strategy(), 0..6),
    )
}

/// `edges(src, dst)`, the `heavy` filter view and the `paths` self-join view.
fn engine() -> Indexer {
    let mut indexer = Indexer::new();
    indexer.add_table("edges", &["src", "dst"]).unwrap();
    let heavy = indexer
        .query("heavy")
        .select("edges", vec![])
        .calculate(">=", vec![("a", field(0, "dst")), ("b", Term::from(3i64))])
        .project(vec![("src", field(0, "src")), ("dst", field(0, "dst"))]);
    indexer.as_view(heavy).unwrap();
    let paths = indexer
        .query("paths")
        .select_as("edges", vec![], "first")
        .select_as("edges", vec![("src", field("first", "dst"))], "second")
        .project(vec![("from", field("first", "src")), ("to", field("second", "dst"))]);
    indexer.as_view(paths).unwrap();
    indexer
}

fn apply(indexer: &mut Indexer, adds: &[Fact], removes: &[Fact]) -> factview_indexer::ApplyReport {
    let mut diff = indexer.diff();
    diff.add_many("edges", adds.iter().cloned())
        .remove_many("edges", removes.iter().cloned());
    indexer.apply_diff(&diff).unwrap()
}

proptest! {
    /// Applying the same diff twice is unobservable the second time.
    #[test]
    fn apply_diff_is_idempotent(batches in prop::collection::vec(batch_strategy(), 1..8)) {
        let mut indexer = engine();
        for (adds, removes) in &batches {
            apply(&mut indexer, adds, removes);
            let edges = indexer.facts("edges");
            let paths = indexer.facts("paths");
            let again = apply(&mut indexer, adds, removes);
            prop_assert!(again.is_empty());
            prop_assert_eq!(indexer.facts("edges"), edges);
            prop_assert_eq!(indexer.facts("paths"), paths);
        }
    }

    /// Incrementally maintained views equal a from-scratch evaluation.
    #[test]
    fn views_match_recomputation(batches in prop::collection::vec(batch_strategy(), 1..8)) {
        let mut indexer = engine();
        for (adds, removes) in &batches {
            apply(&mut indexer, adds, removes);

            let edges: Vec<Fact> = indexer.facts("edges");
            let heavy: BTreeSet<Fact> = edges
                .iter()
                .filter(|e| e[1] >= Value::Int64(3))
                .cloned()
                .collect();
            let mut paths: BTreeSet<Fact> = BTreeSet::new();
            for first in &edges {
                for second in edges.iter().filter(|s| s[0] == first[1]) {
                    paths.insert(Fact::new(vec![first[0].clone(), second[1].clone()]));
                }
            }

            prop_assert_eq!(indexer.facts("heavy").into_iter().collect::<BTreeSet<_>>(), heavy);
            prop_assert_eq!(indexer.facts("paths").into_iter().collect::<BTreeSet<_>>(), paths);
        }
    }
}
