//! The data seam between the executor and table storage.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use factview_core::{Fact, Result, Value};
use factview_index::IndexSpec;
use factview_storage::Table;

/// Tables as seen by the executor.
///
/// A missing table is empty: it has no fields and no facts, and reading it
/// is never an error.
pub trait DataSource {
    /// Returns the field names of a table.
    fn fields(&self, table: &str) -> Option<Vec<String>>;

    /// Returns every fact of a table.
    fn facts(&self, table: &str) -> Vec<Fact>;

    /// Returns the facts equal to `pattern` at every position.
    ///
    /// Takes `&mut self` so implementations can build an index on first use.
    fn find(&mut self, table: &str, pattern: &[(usize, Value)]) -> Result<Vec<Fact>>;
}

/// Sorted, deduplicated positions of a join pattern.
pub fn pattern_positions(pattern: &[(usize, Value)]) -> Vec<usize> {
    let mut positions: Vec<usize> = pattern.iter().map(|(p, _)| *p).collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

/// A catalog of tables keyed by name.
///
/// `find` reads from a collector keyed on the sorted pattern positions,
/// creating it on first use so later executions and diffs keep it current.
impl DataSource for BTreeMap<String, Table> {
    fn fields(&self, table: &str) -> Option<Vec<String>> {
        self.get(table).and_then(Table::fields).map(<[String]>::to_vec)
    }

    fn facts(&self, table: &str) -> Vec<Fact> {
        self.get(table)
            .map(|t| t.facts().cloned().collect())
            .unwrap_or_default()
    }

    fn find(&mut self, table: &str, pattern: &[(usize, Value)]) -> Result<Vec<Fact>> {
        let Some(store) = self.get_mut(table) else {
            return Ok(Vec::new());
        };
        let positions = pattern_positions(pattern);
        if !positions.is_empty() {
            let spec = IndexSpec::collector(positions);
            if !store.has_index(&spec) {
                tracing::debug!(table, index = %spec, "creating join index");
                store.ensure_index(&spec)?;
            }
        }
        Ok(store.find(pattern))
    }
}
