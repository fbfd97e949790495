//! Property-based tests for factview-query using proptest.

use factview_core::{Fact, Value};
use factview_query::{field, FunctionRegistry, Query, Term};
use factview_storage::Table;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn pairs() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..6, 0i64..6), 0..20)
}

fn catalog(left: &[(i64, i64)], right: &[(i64, i64)]) -> BTreeMap<String, Table> {
    let mut tables = BTreeMap::new();
    for (name, rows) in [("left", left), ("right", right)] {
        let mut table = Table::with_fields(name, vec!["k".to_string(), "v".to_string()]);
        let facts: Vec<Fact> = rows
            .iter()
            .map(|(k, v)| Fact::new(vec![Value::Int64(*k), Value::Int64(*v)]))
            .collect();
        table.update(&facts, &[]).unwrap();
        tables.insert(name.to_string(), table);
    }
    tables
}

proptest! {
    /// An indexed join returns the same pairs as a brute-force nested loop.
    #[test]
    fn join_matches_nested_loop(left in pairs(), right in pairs()) {
        let mut tables = catalog(&left, &right);
        let functions = FunctionRegistry::with_builtins();
        let mut query = Query::new()
            .select("left", vec![])
            .select("right", vec![("k", field(0, "k"))])
            .project(vec![("l", field(0, "v")), ("r", field(1, "v"))]);
        let result = query.exec(&functions, &mut tables).unwrap();
        let mut actual: Vec<(Value, Value)> = result
            .projected()
            .unwrap()
            .iter()
            .map(|r| (r.get("l").cloned().unwrap(), r.get("r").cloned().unwrap()))
            .collect();

        let left: Vec<Fact> = tables["left"].facts().cloned().collect();
        let right: Vec<Fact> = tables["right"].facts().cloned().collect();
        let mut expected = Vec::new();
        for l in &left {
            for r in &right {
                if l[0] == r[0] {
                    expected.push((l[1].clone(), r[1].clone()));
                }
            }
        }
        actual.sort();
        expected.sort();
        prop_assert_eq!(actual, expected);
    }

    /// A filter keeps exactly the rows satisfying it, wherever it is declared.
    #[test]
    fn hoisted_filter_matches_post_filter(left in pairs(), right in pairs(), bound in 0i64..6) {
        let mut tables = catalog(&left, &right);
        let functions = FunctionRegistry::with_builtins();
        let mut late = Query::new()
            .select("left", vec![])
            .select("right", vec![])
            .calculate("<", vec![("a", field(0, "v")), ("b", Term::from(bound))]);
        let late_rows = late.exec(&functions, &mut tables).unwrap().len();

        let left_passing = tables["left"]
            .facts()
            .filter(|f| f[1] < Value::Int64(bound))
            .count();
        prop_assert_eq!(late_rows, left_passing * tables["right"].len());
    }
}
