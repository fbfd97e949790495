//! Fact structure for factview.
//!
//! A `Fact` is one tuple of a table. Facts are immutable and shared: every
//! index that holds a fact holds the same allocation.

use crate::value::Value;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::ops::Deref;

/// An immutable ordered tuple of values.
///
/// Equality and hashing are field-by-field in position order, which makes the
/// fact itself the content hash used for deduplication.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    values: Rc<[Value]>,
}

impl Fact {
    /// Creates a new fact from the given values.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Returns the values of this fact.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Gets the value at the given position.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Gets the value at the given position, or `Null` when out of range.
    #[inline]
    pub fn get_or_null(&self, index: usize) -> Value {
        self.values.get(index).cloned().unwrap_or(Value::Null)
    }

    /// Returns the number of values in this fact.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this fact has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Extracts the values at the given positions, in order.
    pub fn project(&self, positions: &[usize]) -> Vec<Value> {
        positions.iter().map(|&i| self.get_or_null(i)).collect()
    }

    /// Returns true if both facts share the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Fact) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

impl Deref for Fact {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for Fact {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl<const N: usize> From<[Value; N]> for Fact {
    fn from(values: [Value; N]) -> Self {
        Self::new(Vec::from(values))
    }
}

impl FromIterator<Value> for Fact {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

/// Field names for a table whose schema was inferred from positional facts.
pub fn positional_fields(arity: usize) -> Vec<String> {
    (0..arity).map(|i| i.to_string()).collect()
}
