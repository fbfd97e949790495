//! Comparators for ordering facts by key positions.

use alloc::vec::Vec;
use core::cmp::Ordering;
use factview_core::{Fact, Value};

/// Sort order for a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// Ascending order (smallest first)
    #[default]
    Asc,
    /// Descending order (largest first)
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// Compares facts key by key: the first key decides, later keys break ties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactComparator {
    keys: Vec<(usize, Order)>,
}

impl FactComparator {
    /// Creates a comparator with explicit orders per key position.
    pub fn new(keys: Vec<(usize, Order)>) -> Self {
        Self { keys }
    }

    /// Creates an all-ascending comparator over the given positions.
    pub fn ascending(positions: &[usize]) -> Self {
        Self::new(positions.iter().map(|&p| (p, Order::Asc)).collect())
    }

    /// Returns the key positions and their orders.
    pub fn keys(&self) -> &[(usize, Order)] {
        &self.keys
    }

    /// Compares two facts.
    pub fn compare(&self, a: &Fact, b: &Fact) -> Ordering {
        for &(position, order) in &self.keys {
            let cmp = match (a.get(position), b.get(position)) {
                (Some(av), Some(bv)) => order.apply(av.cmp(bv)),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

/// Compares two key tuples with per-key orders, missing entries first.
pub fn compare_keys(a: &[Value], b: &[Value], orders: &[Order]) -> Ordering {
    for (i, order) in orders.iter().enumerate() {
        let cmp = match (a.get(i), b.get(i)) {
            (Some(av), Some(bv)) => order.apply(av.cmp(bv)),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn fact(a: i64, b: &str) -> Fact {
        Fact::new(vec![Value::Int64(a), Value::from(b)])
    }

    #[test]
    fn test_order_apply() {
        assert_eq!(Order::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Order::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Order::Desc.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn test_first_key_decides() {
        let cmp = FactComparator::ascending(&[0, 1]);
        assert_eq!(cmp.compare(&fact(1, "z"), &fact(2, "a")), Ordering::Less);
        assert_eq!(cmp.compare(&fact(1, "b"), &fact(1, "a")), Ordering::Greater);
        assert_eq!(cmp.compare(&fact(1, "a"), &fact(1, "a")), Ordering::Equal);
    }

    #[test]
    fn test_mixed_orders() {
        let cmp = FactComparator::new(vec![(1, Order::Asc), (0, Order::Desc)]);
        // Same second field, first field descending
        assert_eq!(cmp.compare(&fact(5, "a"), &fact(1, "a")), Ordering::Less);
        assert_eq!(cmp.compare(&fact(5, "a"), &fact(1, "b")), Ordering::Less);
    }

    #[test]
    fn test_missing_position_sorts_first() {
        let cmp = FactComparator::ascending(&[2]);
        let short = fact(1, "a");
        let long = Fact::new(vec![Value::Int64(1), Value::from("a"), Value::Int64(0)]);
        assert_eq!(cmp.compare(&short, &long), Ordering::Less);
    }

    #[test]
    fn test_compare_keys() {
        let a = vec![Value::Int64(1), Value::Int64(9)];
        let b = vec![Value::Int64(1), Value::Int64(3)];
        assert_eq!(compare_keys(&a, &b, &[Order::Asc, Order::Asc]), Ordering::Greater);
        assert_eq!(compare_keys(&a, &b, &[Order::Asc, Order::Desc]), Ordering::Less);
        assert_eq!(compare_keys(&a, &b, &[Order::Asc]), Ordering::Equal);
    }
}
