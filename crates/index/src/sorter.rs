//! Sorter index: facts in one list, totally ordered by sort keys.

use crate::comparator::FactComparator;
use crate::traits::IndexMaintainer;
use alloc::vec::Vec;
use core::cmp::Ordering;
use factview_core::Fact;

/// Keeps facts sorted ascending by its key positions.
///
/// Inserts are stable: a fact that compares equal to existing ones goes after
/// them, so facts added in one diff keep their relative order.
#[derive(Clone, Debug, PartialEq)]
pub struct SorterIndex {
    comparator: FactComparator,
    facts: Vec<Fact>,
}

impl SorterIndex {
    /// Creates an empty sorter over the given key positions, primary key first.
    pub fn new(keys: &[usize]) -> Self {
        Self {
            comparator: FactComparator::ascending(keys),
            facts: Vec::new(),
        }
    }

    /// Returns the facts in sorted order.
    #[inline]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Returns the smallest fact.
    pub fn first(&self) -> Option<&Fact> {
        self.facts.first()
    }

    /// Returns the largest fact.
    pub fn last(&self) -> Option<&Fact> {
        self.facts.last()
    }

    /// Returns the comparator.
    pub fn comparator(&self) -> &FactComparator {
        &self.comparator
    }

    fn remove_one(&mut self, fact: &Fact) -> bool {
        // Equal facts compare equal, so only the run of equal keys is scanned.
        let start = self
            .facts
            .partition_point(|f| self.comparator.compare(f, fact) == Ordering::Less);
        let found = self.facts[start..]
            .iter()
            .take_while(|f| self.comparator.compare(f, fact) == Ordering::Equal)
            .position(|f| f == fact);
        match found {
            Some(offset) => {
                self.facts.remove(start + offset);
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, fact: Fact) {
        let at = self
            .facts
            .partition_point(|f| self.comparator.compare(f, &fact) != Ordering::Greater);
        self.facts.insert(at, fact);
    }
}

impl IndexMaintainer for SorterIndex {
    fn apply(&mut self, adds: &[Fact], removes: &[Fact]) {
        for remove in removes {
            self.remove_one(remove);
        }
        for add in adds {
            self.insert(add.clone());
        }
    }

    fn clear(&mut self) {
        self.facts.clear();
    }

    fn len(&self) -> usize {
        self.facts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use factview_core::Value;

    fn fact(score: i64, name: &str) -> Fact {
        Fact::new(vec![Value::Int64(score), Value::from(name)])
    }

    #[test]
    fn test_sorted_insert() {
        let mut index = SorterIndex::new(&[0]);
        index.apply(&[fact(3, "c"), fact(1, "a"), fact(2, "b")], &[]);
        assert_eq!(index.facts(), &[fact(1, "a"), fact(2, "b"), fact(3, "c")][..]);
        assert_eq!(index.first(), Some(&fact(1, "a")));
        assert_eq!(index.last(), Some(&fact(3, "c")));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = SorterIndex::new(&[0]);
        index.apply(&[fact(1, "x"), fact(1, "y"), fact(0, "z"), fact(1, "w")], &[]);
        assert_eq!(
            index.facts(),
            &[fact(0, "z"), fact(1, "x"), fact(1, "y"), fact(1, "w")][..]
        );
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let mut index = SorterIndex::new(&[0, 1]);
        index.apply(&[fact(1, "y"), fact(1, "x")], &[]);
        assert_eq!(index.facts(), &[fact(1, "x"), fact(1, "y")][..]);
    }

    #[test]
    fn test_remove_exact_fact() {
        let mut index = SorterIndex::new(&[0]);
        index.apply(&[fact(1, "x"), fact(1, "y"), fact(2, "z")], &[]);
        index.apply(&[], &[fact(1, "y")]);
        assert_eq!(index.facts(), &[fact(1, "x"), fact(2, "z")][..]);

        // absent fact: no-op
        index.apply(&[], &[fact(1, "q")]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_keys_is_insertion_order() {
        let mut index = SorterIndex::new(&[]);
        index.apply(&[fact(3, "c"), fact(1, "a")], &[]);
        assert_eq!(index.facts(), &[fact(3, "c"), fact(1, "a")][..]);
    }
}
