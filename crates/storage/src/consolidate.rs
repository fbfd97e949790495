//! Net multiplicity of facts within one diff.

use alloc::vec::Vec;
use factview_core::Fact;
use hashbrown::HashMap;

/// Consolidates `+1`/`-1` changes per fact, remembering first-seen order.
///
/// Order matters for the real adds reported back to the caller: a sorter
/// index receives facts in the order they appeared in the diff.
#[derive(Clone, Debug, Default)]
pub struct NetCounts {
    order: Vec<Fact>,
    counts: HashMap<Fact, i32>,
}

impl NetCounts {
    /// Creates an empty consolidation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `diff` to the net count of `fact`.
    pub fn apply(&mut self, fact: &Fact, diff: i32) {
        match self.counts.get_mut(fact) {
            Some(count) => *count += diff,
            None => {
                self.order.push(fact.clone());
                self.counts.insert(fact.clone(), diff);
            }
        }
    }

    /// Returns the net count of `fact` (zero if never seen).
    pub fn get(&self, fact: &Fact) -> i32 {
        self.counts.get(fact).copied().unwrap_or(0)
    }

    /// Iterates over `(fact, net count)` in first-seen order, including zeros.
    pub fn iter(&self) -> impl Iterator<Item = (&Fact, i32)> {
        self.order.iter().map(|fact| (fact, self.get(fact)))
    }

    /// Returns the number of distinct facts seen.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no fact has been seen.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use factview_core::Value;

    fn fact(n: i64) -> Fact {
        Fact::new(vec![Value::Int64(n)])
    }

    #[test]
    fn test_net_counts() {
        let mut counts = NetCounts::new();
        counts.apply(&fact(1), 1);
        counts.apply(&fact(1), 1);
        counts.apply(&fact(2), 1);
        counts.apply(&fact(1), -1);
        counts.apply(&fact(3), -1);

        assert_eq!(counts.get(&fact(1)), 1);
        assert_eq!(counts.get(&fact(3)), -1);
        assert_eq!(counts.get(&fact(9)), 0);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_first_seen_order() {
        let mut counts = NetCounts::new();
        for n in [3, 1, 3, 2] {
            counts.apply(&fact(n), 1);
        }
        let order: Vec<i64> = counts
            .iter()
            .map(|(f, _)| f.get(0).and_then(Value::as_i64).unwrap())
            .collect();
        assert_eq!(order, vec![3, 1, 2]);
    }
}
