//! Diffs: batches of adds and removes across tables.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use factview_core::{Fact, Record, Result, Value};

/// One changed row, either positional or named.
#[derive(Clone, Debug, PartialEq)]
pub enum Row {
    /// A positional fact.
    Fact(Fact),
    /// A record whose field names are mapped onto the table schema.
    Record(Record),
}

impl From<Fact> for Row {
    fn from(fact: Fact) -> Self {
        Row::Fact(fact)
    }
}

impl From<Record> for Row {
    fn from(record: Record) -> Self {
        Row::Record(record)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::Fact(Fact::new(values))
    }
}

/// The adds and removes for a single table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableDiff {
    /// Candidate adds.
    pub adds: Vec<Row>,
    /// Candidate removes.
    pub removes: Vec<Row>,
}

impl TableDiff {
    /// Creates a table diff from positional adds and removes.
    pub fn new(adds: Vec<Fact>, removes: Vec<Fact>) -> Self {
        Self {
            adds: adds.into_iter().map(Row::Fact).collect(),
            removes: removes.into_iter().map(Row::Fact).collect(),
        }
    }

    /// Returns the number of candidate changes.
    pub fn len(&self) -> usize {
        self.adds.len() + self.removes.len()
    }

    /// Returns true if there are no candidate changes.
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }
}

/// Read access to current facts, used to turn patterns into removes.
pub trait FactLookup {
    /// Returns every fact of `table` whose named fields equal the pattern's
    /// values. A missing table has no facts.
    fn find(&self, table: &str, pattern: &Record) -> Result<Vec<Fact>>;
}

/// A changeset across tables.
///
/// Adds and removes of the same fact cancel by net count when the diff is
/// applied, so building a diff never needs to consult current state.
///
/// # Example
///
/// ```rust
/// use factview_core::{Fact, Record, Value};
/// use factview_storage::Diff;
///
/// let mut diff = Diff::new();
/// diff.add("people", vec![Value::from("carol"), Value::from(40i64)])
///     .add_record("people", Record::new().with("name", "dave").with("age", 50i64))
///     .remove("people", vec![Value::from("bob"), Value::from(25i64)]);
///
/// assert_eq!(diff.len(), 3);
/// assert_eq!(diff.tables().collect::<Vec<_>>(), vec!["people"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diff {
    tables: BTreeMap<String, TableDiff>,
}

impl Diff {
    /// Creates an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutable changes for a table, creating them if needed.
    pub fn table_mut(&mut self, table: &str) -> &mut TableDiff {
        self.tables.entry(String::from(table)).or_default()
    }

    /// Returns the changes for a table.
    pub fn get(&self, table: &str) -> Option<&TableDiff> {
        self.tables.get(table)
    }

    /// Adds a fact.
    pub fn add(&mut self, table: &str, fact: impl Into<Fact>) -> &mut Self {
        self.table_mut(table).adds.push(Row::Fact(fact.into()));
        self
    }

    /// Adds several facts.
    pub fn add_many<F: Into<Fact>>(
        &mut self,
        table: &str,
        facts: impl IntoIterator<Item = F>,
    ) -> &mut Self {
        let adds = &mut self.table_mut(table).adds;
        adds.extend(facts.into_iter().map(|f| Row::Fact(f.into())));
        self
    }

    /// Adds a named record.
    pub fn add_record(&mut self, table: &str, record: Record) -> &mut Self {
        self.table_mut(table).adds.push(Row::Record(record));
        self
    }

    /// Removes a fact.
    pub fn remove(&mut self, table: &str, fact: impl Into<Fact>) -> &mut Self {
        self.table_mut(table).removes.push(Row::Fact(fact.into()));
        self
    }

    /// Removes several facts.
    pub fn remove_many<F: Into<Fact>>(
        &mut self,
        table: &str,
        facts: impl IntoIterator<Item = F>,
    ) -> &mut Self {
        let removes = &mut self.table_mut(table).removes;
        removes.extend(facts.into_iter().map(|f| Row::Fact(f.into())));
        self
    }

    /// Removes a named record.
    pub fn remove_record(&mut self, table: &str, record: Record) -> &mut Self {
        self.table_mut(table).removes.push(Row::Record(record));
        self
    }

    /// Removes every fact of `table` currently matching `pattern`.
    ///
    /// Returns the number of removes queued.
    pub fn remove_matching(
        &mut self,
        source: &impl FactLookup,
        table: &str,
        pattern: &Record,
    ) -> Result<usize> {
        let matches = source.find(table, pattern)?;
        let count = matches.len();
        self.remove_many(table, matches);
        Ok(count)
    }

    /// Returns the total number of candidate changes.
    pub fn len(&self) -> usize {
        self.tables.values().map(TableDiff::len).sum()
    }

    /// Returns true if no table has candidate changes.
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(TableDiff::is_empty)
    }

    /// Returns the names of tables with candidate changes.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|(_, changes)| !changes.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Iterates over `(table, changes)`, skipping tables without changes.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableDiff)> {
        self.tables
            .iter()
            .filter(|(_, changes)| !changes.is_empty())
            .map(|(name, changes)| (name.as_str(), changes))
    }

    /// Appends all changes of `other` to this diff.
    pub fn merge(&mut self, other: Diff) -> &mut Self {
        for (name, changes) in other.tables {
            let target = self.tables.entry(name).or_default();
            target.adds.extend(changes.adds);
            target.removes.extend(changes.removes);
        }
        self
    }
}
