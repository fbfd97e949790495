//! What a diff application changed.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use factview_core::Fact;
use factview_storage::Changes;

/// The real changes per table and the triggers fired, cascades included.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyReport {
    changes: BTreeMap<String, Changes>,
    fired: Vec<String>,
}

impl ApplyReport {
    pub(crate) fn record(&mut self, table: &str, changes: Changes) {
        self.changes
            .entry(String::from(table))
            .or_default()
            .extend(changes);
    }

    pub(crate) fn fire(&mut self, trigger: &str) {
        self.fired.push(String::from(trigger));
    }

    /// Returns the real changes of a table.
    pub fn changes(&self, table: &str) -> Option<&Changes> {
        self.changes.get(table)
    }

    /// Returns the facts that became present in a table.
    pub fn added(&self, table: &str) -> &[Fact] {
        self.changes.get(table).map(|c| c.adds.as_slice()).unwrap_or(&[])
    }

    /// Returns the facts that stopped being present in a table.
    pub fn removed(&self, table: &str) -> &[Fact] {
        self.changes
            .get(table)
            .map(|c| c.removes.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the tables that really changed, sorted.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Returns the triggers fired, in firing order.
    pub fn fired(&self) -> &[String] {
        &self.fired
    }

    /// Returns true if nothing changed and nothing fired.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.fired.is_empty()
    }
}
