//! Trigger registry.
//!
//! Maps each table to the named queries that read it, so a diff touching
//! a table can find the views to re-run.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use factview_query::Query;
use hashbrown::HashMap;

/// A named query bound to the tables it selects from.
#[derive(Clone, Debug)]
pub struct Trigger {
    query: Rc<RefCell<Query>>,
    tables: Vec<String>,
}

impl Trigger {
    /// Returns the query.
    pub fn query(&self) -> &Rc<RefCell<Query>> {
        &self.query
    }

    /// Returns the tables the trigger is registered on.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }
}

/// Registered triggers, indexed by the tables they read.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    /// Table name -> trigger names, in registration order
    table_triggers: HashMap<String, Vec<String>>,
    triggers: BTreeMap<String, Trigger>,
}

impl TriggerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `query` under `name` on each of its selected tables,
    /// replacing a previous trigger of the same name.
    pub fn register(&mut self, name: &str, query: Query) -> Rc<RefCell<Query>> {
        self.unregister(name);

        let tables: Vec<String> = query.tables().into_iter().map(String::from).collect();
        for table in &tables {
            self.table_triggers
                .entry(table.clone())
                .or_default()
                .push(String::from(name));
        }
        let query = Rc::new(RefCell::new(query));
        self.triggers.insert(
            String::from(name),
            Trigger {
                query: Rc::clone(&query),
                tables,
            },
        );
        query
    }

    /// Unregisters a trigger. Returns true if it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(trigger) = self.triggers.remove(name) else {
            return false;
        };
        for table in &trigger.tables {
            if let Some(names) = self.table_triggers.get_mut(table) {
                names.retain(|n| n != name);
                if names.is_empty() {
                    self.table_triggers.remove(table);
                }
            }
        }
        true
    }

    /// Returns a trigger.
    pub fn get(&self, name: &str) -> Option<&Trigger> {
        self.triggers.get(name)
    }

    /// Returns the distinct triggers registered on any of `tables`, in the
    /// order the tables are given, each trigger once.
    pub fn for_tables<S: AsRef<str>>(&self, tables: &[S]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for table in tables {
            if let Some(registered) = self.table_triggers.get(table.as_ref()) {
                for name in registered {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        names
    }

    /// Returns the number of triggers reading a table.
    pub fn triggers_for_table(&self, table: &str) -> usize {
        self.table_triggers.get(table).map(Vec::len).unwrap_or(0)
    }

    /// Returns the trigger names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.triggers.keys().map(String::as_str).collect()
    }

    /// Returns the number of triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns true if no trigger is registered.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn reading(tables: &[&str]) -> Query {
        tables
            .iter()
            .fold(Query::new(), |query, table| query.select(table, vec![]))
    }

    #[test]
    fn test_register_on_each_table() {
        let mut registry = TriggerRegistry::new();
        registry.register("both", reading(&["a", "b", "a"]));
        registry.register("only_b", reading(&["b"]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.triggers_for_table("a"), 1);
        assert_eq!(registry.triggers_for_table("b"), 2);
        assert_eq!(registry.get("both").unwrap().tables(), &["a", "b"]);
    }

    #[test]
    fn test_for_tables_deduplicates() {
        let mut registry = TriggerRegistry::new();
        registry.register("both", reading(&["a", "b"]));
        registry.register("only_b", reading(&["b"]));

        assert_eq!(registry.for_tables(&["b", "a"]), vec!["both", "only_b"]);
        assert_eq!(registry.for_tables(&["a"]), vec!["both"]);
        assert!(registry.for_tables(&["c"]).is_empty());
    }

    #[test]
    fn test_unregister_and_replace() {
        let mut registry = TriggerRegistry::new();
        registry.register("v", reading(&["a"]));
        registry.register("v", reading(&["b"]));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.triggers_for_table("a"), 0);
        assert_eq!(registry.triggers_for_table("b"), 1);

        assert!(registry.unregister("v"));
        assert!(!registry.unregister("v"));
        assert!(registry.is_empty());
    }
}
