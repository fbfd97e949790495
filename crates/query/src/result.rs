//! Query results.

use alloc::vec::Vec;
use factview_core::{Fact, Record, Value};

/// What one step bound in a result row.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// Nothing bound (an effect function, or a step not reached).
    Empty,
    /// The fact bound by a select.
    Fact(Fact),
    /// The value bound by a function or aggregate.
    Value(Value),
}

impl Slot {
    /// Returns the bound fact.
    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            Slot::Fact(fact) => Some(fact),
            _ => None,
        }
    }

    /// Returns the bound value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// The rows a query produced, and their projections when it projects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub(crate) rows: Vec<Vec<Slot>>,
    pub(crate) projected: Option<Vec<Record>>,
}

impl QueryResult {
    /// Returns the raw rows, one slot per builder step.
    pub fn rows(&self) -> &[Vec<Slot>] {
        &self.rows
    }

    /// Returns the projected records.
    pub fn projected(&self) -> Option<&[Record]> {
        self.projected.as_deref()
    }

    /// Consumes the result, returning the projected records.
    pub fn into_projected(self) -> Option<Vec<Record>> {
        self.projected
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
