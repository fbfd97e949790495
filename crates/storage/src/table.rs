//! Fact tables.
//!
//! A `Table` stores each distinct fact once, in insertion order, together
//! with a membership map used for content-hash deduplication. Both are
//! updated together, so a fact is in one exactly when it is in the other.
//!
//! Mutation is split in two steps. `resolve` maps a `TableDiff` onto the
//! schema and validates it without touching the table; `commit` nets the
//! resolved adds and removes and applies only the real changes to the store
//! and every index. Callers applying a multi-table diff resolve every table
//! first so that a rejected diff leaves no table modified.

use crate::consolidate::NetCounts;
use crate::diff::{Row, TableDiff};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use factview_core::{positional_fields, Error, Fact, Record, Result, Value};
use factview_index::{FactIndex, IndexSpec};
use hashbrown::HashMap;

/// The real changes a commit made.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changes {
    /// Facts that became present.
    pub adds: Vec<Fact>,
    /// Facts that stopped being present.
    pub removes: Vec<Fact>,
}

impl Changes {
    /// Returns the number of real changes.
    pub fn len(&self) -> usize {
        self.adds.len() + self.removes.len()
    }

    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }

    /// Appends another batch of changes.
    pub fn extend(&mut self, other: Changes) {
        self.adds.extend(other.adds);
        self.removes.extend(other.removes);
    }
}

/// A table diff mapped onto a schema and validated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolved {
    /// Candidate adds as positional facts.
    pub adds: Vec<Fact>,
    /// Candidate removes as positional facts.
    pub removes: Vec<Fact>,
    fields: Option<Vec<String>>,
}

/// A named, deduplicated set of facts and the indexes over it.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    fields: Option<Vec<String>>,
    facts: BTreeMap<u64, Fact>,
    members: HashMap<Fact, u64>,
    next_seq: u64,
    indexes: BTreeMap<String, FactIndex>,
}

impl Table {
    /// Creates an empty table whose schema comes from the first row added.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: None,
            facts: BTreeMap::new(),
            members: HashMap::new(),
            next_seq: 0,
            indexes: BTreeMap::new(),
        }
    }

    /// Creates an empty table with a declared schema.
    pub fn with_fields(name: impl Into<String>, fields: Vec<String>) -> Self {
        let mut table = Self::new(name);
        table.fields = Some(fields);
        table
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field names, once known.
    #[inline]
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Returns the schema arity, once known.
    pub fn arity(&self) -> Option<usize> {
        self.fields.as_ref().map(Vec::len)
    }

    /// Declares (or renames) the schema.
    ///
    /// A table that already holds facts keeps its arity.
    pub fn declare_fields(&mut self, fields: Vec<String>) -> Result<()> {
        if let Some(expected) = self.arity() {
            if !self.facts.is_empty() && expected != fields.len() {
                return Err(Error::arity_mismatch(&self.name, expected, fields.len()));
            }
        }
        self.fields = Some(fields);
        Ok(())
    }

    /// Returns the position of a field. A table without a schema accepts
    /// positional names.
    pub fn field_position(&self, field: &str) -> Option<usize> {
        match &self.fields {
            Some(fields) => fields.iter().position(|f| f == field),
            None => field.parse().ok(),
        }
    }

    /// Returns the number of facts.
    #[inline]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if the table holds no facts.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Returns true if the fact is present.
    pub fn contains(&self, fact: &Fact) -> bool {
        self.members.contains_key(fact)
    }

    /// Iterates over facts in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.facts.values()
    }

    /// Returns the oldest fact.
    pub fn first(&self) -> Option<&Fact> {
        self.facts.values().next()
    }

    /// Returns the newest fact.
    pub fn last(&self) -> Option<&Fact> {
        self.facts.values().next_back()
    }

    /// Converts a fact to a record using the schema.
    pub fn record(&self, fact: &Fact) -> Record {
        match &self.fields {
            Some(fields) => Record::from_fact(fields, fact),
            None => Record::from_fact(&positional_fields(fact.len()), fact),
        }
    }

    /// Maps a diff onto the schema and checks it, without modifying the table.
    ///
    /// Without a schema, the first add (or the first remove when there are no
    /// adds) establishes one. Every row must then match its arity and, for
    /// records, its field names.
    pub fn resolve(&self, diff: &TableDiff) -> Result<Resolved> {
        let fields = match &self.fields {
            Some(fields) => Some(fields.clone()),
            None => diff
                .adds
                .first()
                .or_else(|| diff.removes.first())
                .map(infer_fields),
        };
        let mut resolved = Resolved {
            adds: Vec::with_capacity(diff.adds.len()),
            removes: Vec::with_capacity(diff.removes.len()),
            fields: None,
        };
        if let Some(fields) = &fields {
            for row in &diff.adds {
                resolved.adds.push(self.row_to_fact(fields, row)?);
            }
            for row in &diff.removes {
                resolved.removes.push(self.row_to_fact(fields, row)?);
            }
        }
        if self.fields.is_none() {
            resolved.fields = fields;
        }
        Ok(resolved)
    }

    fn row_to_fact(&self, fields: &[String], row: &Row) -> Result<Fact> {
        match row {
            Row::Fact(fact) => {
                if fact.len() != fields.len() {
                    return Err(Error::arity_mismatch(&self.name, fields.len(), fact.len()));
                }
                Ok(fact.clone())
            }
            Row::Record(record) => {
                if record.len() != fields.len() {
                    return Err(Error::arity_mismatch(&self.name, fields.len(), record.len()));
                }
                fields
                    .iter()
                    .map(|field| {
                        record
                            .get(field)
                            .cloned()
                            .ok_or_else(|| Error::unknown_field(&self.name, field.as_str()))
                    })
                    .collect::<Result<Vec<Value>>>()
                    .map(Fact::new)
            }
        }
    }

    /// Applies a resolved diff and returns the real changes.
    ///
    /// Each fact's net count starts at 1 if present and 0 otherwise; every add
    /// is +1 and every remove -1. A fact going from absent to a positive count
    /// is a real add, a present fact ending at zero or below is a real remove.
    /// Everything else leaves the table and its indexes untouched.
    pub fn commit(&mut self, resolved: Resolved) -> Changes {
        if let Some(fields) = resolved.fields {
            self.fields = Some(fields);
        }

        let mut counts = NetCounts::new();
        for fact in &resolved.adds {
            counts.apply(fact, 1);
        }
        for fact in &resolved.removes {
            counts.apply(fact, -1);
        }

        let mut changes = Changes::default();
        for (fact, net) in counts.iter() {
            let present = self.contains(fact);
            let total = i32::from(present) + net;
            if total > 0 && !present {
                changes.adds.push(fact.clone());
            } else if total <= 0 && present {
                changes.removes.push(fact.clone());
            }
        }

        if changes.is_empty() {
            return changes;
        }

        for fact in &changes.removes {
            if let Some(seq) = self.members.remove(fact) {
                self.facts.remove(&seq);
            }
        }
        for fact in &changes.adds {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.facts.insert(seq, fact.clone());
            self.members.insert(fact.clone(), seq);
        }
        for index in self.indexes.values_mut() {
            index.apply(&changes.adds, &changes.removes);
        }
        changes
    }

    /// Resolves and commits positional adds and removes in one step.
    pub fn update(&mut self, adds: &[Fact], removes: &[Fact]) -> Result<Changes> {
        let diff = TableDiff::new(adds.to_vec(), removes.to_vec());
        let resolved = self.resolve(&diff)?;
        Ok(self.commit(resolved))
    }

    /// Empties the store and every index, keeping the schema and the index
    /// definitions. Returns the facts that were present.
    pub fn clear(&mut self) -> Vec<Fact> {
        let removed: Vec<Fact> = core::mem::take(&mut self.facts).into_values().collect();
        self.members.clear();
        for index in self.indexes.values_mut() {
            index.clear();
        }
        removed
    }

    /// Returns the index for a spec, if it exists.
    pub fn index(&self, spec: &IndexSpec) -> Option<&FactIndex> {
        self.indexes.get(&spec.tag())
    }

    /// Returns true if the index exists.
    pub fn has_index(&self, spec: &IndexSpec) -> bool {
        self.indexes.contains_key(&spec.tag())
    }

    /// Returns the index for a spec, building it from the current facts on
    /// first request.
    pub fn ensure_index(&mut self, spec: &IndexSpec) -> Result<&FactIndex> {
        spec.validate()?;
        let facts = &self.facts;
        Ok(self
            .indexes
            .entry(spec.tag())
            .or_insert_with(|| FactIndex::build(spec.clone(), facts.values())))
    }

    /// Drops an index. Returns true if it existed.
    pub fn remove_index(&mut self, spec: &IndexSpec) -> bool {
        self.indexes.remove(&spec.tag()).is_some()
    }

    /// Iterates over the live indexes.
    pub fn indexes(&self) -> impl Iterator<Item = &FactIndex> {
        self.indexes.values()
    }

    /// Maps a named pattern onto field positions.
    pub fn pattern(&self, pattern: &Record) -> Result<Vec<(usize, Value)>> {
        pattern
            .iter()
            .map(|(field, value)| {
                self.field_position(field)
                    .map(|position| (position, value.clone()))
                    .ok_or_else(|| Error::unknown_field(&self.name, field))
            })
            .collect()
    }

    /// Returns the facts whose values equal the pattern at every position.
    ///
    /// Uses a collector keyed on exactly the pattern positions when one
    /// exists, otherwise scans.
    pub fn find(&self, pattern: &[(usize, Value)]) -> Vec<Fact> {
        let mut positions: Vec<usize> = pattern.iter().map(|(p, _)| *p).collect();
        positions.sort_unstable();
        positions.dedup();
        let spec = IndexSpec::collector(positions.clone());

        let matches = |fact: &&Fact| pattern.iter().all(|(p, v)| fact.get(*p) == Some(v));

        if !positions.is_empty() {
            if let Some(collector) = self.index(&spec).and_then(FactIndex::as_collector) {
                let key: Vec<Value> = positions
                    .iter()
                    .map(|p| {
                        pattern
                            .iter()
                            .find(|(q, _)| q == p)
                            .map(|(_, v)| v.clone())
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                return collector.get(&key).iter().filter(matches).cloned().collect();
            }
        }
        self.facts.values().filter(matches).cloned().collect()
    }
}

fn infer_fields(row: &Row) -> Vec<String> {
    match row {
        Row::Fact(fact) => positional_fields(fact.len()),
        Row::Record(record) => record.field_names().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use factview_index::LookupValue;

    fn person(name: &str, age: i64) -> Fact {
        Fact::new(vec![Value::from(name), Value::from(age)])
    }

    fn people() -> Table {
        Table::with_fields("people", vec!["name".to_string(), "age".to_string()])
    }

    #[test]
    fn test_duplicate_adds_register_once() {
        let mut table = people();
        let changes = table
            .update(&[person("alice", 30), person("alice", 30)], &[])
            .unwrap();
        assert_eq!(changes.adds, vec![person("alice", 30)]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_add_and_remove_cancel() {
        let mut table = people();
        let changes = table
            .update(&[person("alice", 30)], &[person("alice", 30)])
            .unwrap();
        assert!(changes.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_and_readd_present_fact_is_noop() {
        let mut table = people();
        table.update(&[person("alice", 30)], &[]).unwrap();
        let changes = table
            .update(&[person("alice", 30)], &[person("alice", 30)])
            .unwrap();
        assert!(changes.is_empty());
        assert!(table.contains(&person("alice", 30)));
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let mut table = people();
        let adds = [person("alice", 30), person("bob", 25)];
        assert_eq!(table.update(&adds, &[]).unwrap().len(), 2);
        assert!(table.update(&adds, &[]).unwrap().is_empty());

        let removes = [person("bob", 25)];
        assert_eq!(table.update(&[], &removes).unwrap().removes, removes.to_vec());
        assert!(table.update(&[], &removes).unwrap().is_empty());
    }

    #[test]
    fn test_insertion_order() {
        let mut table = people();
        table
            .update(&[person("b", 2), person("a", 1), person("c", 3)], &[])
            .unwrap();
        table.update(&[], &[person("a", 1)]).unwrap();
        table.update(&[person("a", 1)], &[]).unwrap();
        let names: Vec<&Value> = table.facts().map(|f| &f[0]).collect();
        assert_eq!(names, vec![&Value::from("b"), &Value::from("c"), &Value::from("a")]);
        assert_eq!(table.first(), Some(&person("b", 2)));
        assert_eq!(table.last(), Some(&person("a", 1)));
    }

    #[test]
    fn test_schema_inferred_from_first_fact() {
        let mut table = Table::new("pairs");
        table.update(&[person("a", 1)], &[]).unwrap();
        assert_eq!(table.fields().unwrap(), &["0", "1"]);

        let err = table
            .update(&[Fact::new(vec![Value::Int64(1)])], &[])
            .unwrap_err();
        assert_eq!(err, Error::arity_mismatch("pairs", 2, 1));
    }

    #[test]
    fn test_arity_mismatch_rejects_whole_diff() {
        let mut table = people();
        let err = table
            .update(&[person("a", 1), Fact::new(vec![Value::Int64(1)])], &[])
            .unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_records_map_onto_schema() {
        let table = people();
        let mut diff = TableDiff::default();
        diff.adds
            .push(Row::Record(Record::new().with("age", 40i64).with("name", "carol")));
        let resolved = table.resolve(&diff).unwrap();
        assert_eq!(resolved.adds, vec![person("carol", 40)]);

        let mut bad = TableDiff::default();
        bad.adds
            .push(Row::Record(Record::new().with("name", "x").with("height", 1i64)));
        assert_eq!(
            table.resolve(&bad).unwrap_err(),
            Error::unknown_field("people", "age")
        );
    }

    #[test]
    fn test_schema_inferred_from_record() {
        let mut table = Table::new("adults");
        let mut diff = TableDiff::default();
        diff.adds
            .push(Row::Record(Record::new().with("name", "carol").with("age", 40i64)));
        let resolved = table.resolve(&diff).unwrap();
        table.commit(resolved);
        assert_eq!(table.fields().unwrap(), &["name", "age"]);
        assert_eq!(table.record(&person("carol", 40)).get("age"), Some(&Value::Int64(40)));
    }

    #[test]
    fn test_index_built_from_existing_facts_and_maintained() {
        let mut table = people();
        table.update(&[person("alice", 30), person("bob", 30)], &[]).unwrap();

        let spec = IndexSpec::collector(vec![1]);
        let index = table.ensure_index(&spec).unwrap();
        assert_eq!(index.as_collector().unwrap().get(&[Value::Int64(30)]).len(), 2);

        table.update(&[person("carol", 30)], &[person("alice", 30)]).unwrap();
        let collector = table.index(&spec).unwrap().as_collector().unwrap();
        assert_eq!(
            collector.get(&[Value::Int64(30)]),
            &[person("bob", 30), person("carol", 30)][..]
        );
    }

    #[test]
    fn test_same_spec_returns_same_index() {
        let mut table = people();
        table.ensure_index(&IndexSpec::sorter(vec![1])).unwrap();
        table.ensure_index(&IndexSpec::sorter(vec![1])).unwrap();
        assert_eq!(table.indexes().count(), 1);
        assert!(table.remove_index(&IndexSpec::sorter(vec![1])));
        assert!(!table.has_index(&IndexSpec::sorter(vec![1])));
    }

    #[test]
    fn test_clear_keeps_index_definitions() {
        let mut table = people();
        let spec = IndexSpec::lookup(vec![0], LookupValue::Field(1));
        table.ensure_index(&spec).unwrap();
        table.update(&[person("alice", 30)], &[]).unwrap();

        let removed = table.clear();
        assert_eq!(removed, vec![person("alice", 30)]);
        assert!(table.is_empty());
        assert!(table.index(&spec).unwrap().is_empty());
        assert_eq!(table.fields().unwrap().len(), 2);
    }

    #[test]
    fn test_find_with_and_without_collector() {
        let mut table = people();
        table
            .update(&[person("alice", 30), person("bob", 25), person("carol", 30)], &[])
            .unwrap();
        let pattern = table.pattern(&Record::new().with("age", 30i64)).unwrap();
        assert_eq!(table.find(&pattern), vec![person("alice", 30), person("carol", 30)]);

        table.ensure_index(&IndexSpec::collector(vec![1])).unwrap();
        assert_eq!(table.find(&pattern), vec![person("alice", 30), person("carol", 30)]);

        assert_eq!(
            table.pattern(&Record::new().with("height", 1i64)).unwrap_err(),
            Error::unknown_field("people", "height")
        );
    }

    #[test]
    fn test_numbers_are_one_domain() {
        let mut table = Table::new("nums");
        let int = Fact::new(vec![Value::Int64(1)]);
        let float = Fact::new(vec![Value::Float64(1.0)]);

        let changes = table.update(&[int.clone()], &[]).unwrap();
        assert_eq!(changes.adds.len(), 1);
        assert!(table.update(&[float.clone()], &[]).unwrap().is_empty());
        assert_eq!(table.len(), 1);

        table.ensure_index(&IndexSpec::collector(vec![0])).unwrap();
        assert_eq!(table.find(&[(0, Value::Float64(1.0))]), vec![int.clone()]);

        let changes = table.update(&[], &[float]).unwrap();
        assert_eq!(changes.removes, vec![int]);
        assert!(table.is_empty());
    }
}
