//! The indexer engine.
//!
//! `Indexer` is the only way facts change. A diff is validated against every
//! table it names before any table is touched, then committed, then each
//! trigger reading a changed table re-runs once. A trigger with a projection
//! writes its output back through another diff, which may fire more triggers.

use crate::config::IndexerConfig;
use crate::report::ApplyReport;
use crate::trigger::TriggerRegistry;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use factview_core::{Error, Fact, Record, Result, Value};
use factview_index::{FactIndex, IndexSpec};
use factview_query::{DataSource, FunctionRegistry, Query, QueryResult};
use factview_storage::{Changes, Diff, FactLookup, Table};
use hashbrown::HashMap;

/// Incremental fact indexer with trigger-maintained views.
///
/// # Example
///
/// ```rust
/// use factview_core::{Record, Value};
/// use factview_indexer::Indexer;
/// use factview_query::field;
///
/// let mut indexer = Indexer::new();
/// indexer.add_table("people", &["name", "age"]).unwrap();
///
/// let adults = indexer
///     .query("adults")
///     .select("people", vec![])
///     .calculate(">=", vec![("a", field(0, "age")), ("b", 18i64.into())])
///     .project(vec![("name", field(0, "name"))]);
/// indexer.as_view(adults).unwrap();
///
/// let mut diff = indexer.diff();
/// diff.add("people", vec![Value::from("alice"), Value::from(30i64)])
///     .add("people", vec![Value::from("tim"), Value::from(9i64)]);
/// let report = indexer.apply_diff(&diff).unwrap();
///
/// assert_eq!(report.fired(), &["adults"]);
/// assert_eq!(
///     indexer.records("adults"),
///     vec![Record::new().with("name", "alice")]
/// );
/// ```
#[derive(Debug)]
pub struct Indexer {
    config: IndexerConfig,
    tables: BTreeMap<String, Table>,
    /// Alias name -> (table, index spec)
    aliases: HashMap<String, (String, IndexSpec)>,
    functions: FunctionRegistry,
    triggers: TriggerRegistry,
    /// Triggers currently running, outermost first
    active: Vec<String>,
    last_diffed: BTreeSet<String>,
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Indexer {
    /// Creates an indexer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(IndexerConfig::default())
    }

    /// Creates an indexer with the given configuration.
    pub fn with_config(config: IndexerConfig) -> Self {
        Self {
            config,
            tables: BTreeMap::new(),
            aliases: HashMap::new(),
            functions: default_functions(),
            triggers: TriggerRegistry::new(),
            active: Vec::new(),
            last_diffed: BTreeSet::new(),
        }
    }

    /// Replaces the function registry.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Returns the function registry.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Returns the function registry for registration.
    ///
    /// Queries already compiled keep the definitions they were compiled with.
    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    // ---- tables ----

    /// Declares a table's schema, creating the table if needed.
    pub fn add_table(&mut self, name: &str, fields: &[&str]) -> Result<()> {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        match self.tables.get_mut(name) {
            Some(table) => table.declare_fields(fields),
            None => {
                self.tables
                    .insert(name.to_string(), Table::with_fields(name, fields));
                Ok(())
            }
        }
    }

    /// Returns a table.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Returns true if the table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Returns the table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Empties a table and its indexes, then fires the triggers reading it.
    pub fn clear_table(&mut self, name: &str) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        let removed = match self.tables.get_mut(name) {
            Some(table) => table.clear(),
            None => return Ok(report),
        };
        if removed.is_empty() {
            return Ok(report);
        }

        tracing::debug!(table = name, removes = removed.len(), "cleared table");
        report.record(
            name,
            Changes {
                adds: Vec::new(),
                removes: removed,
            },
        );
        let touched = [name.to_string()];
        let result = self.fire(&touched, &mut report, 0);
        self.finish(&report);
        result.map(|()| report)
    }

    // ---- diffs ----

    /// Returns an empty diff to fill and apply.
    pub fn diff(&self) -> Diff {
        Diff::new()
    }

    /// Applies a diff and runs the triggers it affects.
    ///
    /// Nothing is written unless every table in the diff accepts its
    /// changes. Trigger errors surface after the originating changes have
    /// been committed; the report of what was applied is lost in that case.
    pub fn apply_diff(&mut self, diff: &Diff) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        let result = self.apply_nested(diff, &mut report, 0);
        self.finish(&report);
        result.map(|()| report)
    }

    /// Returns true if the last applied diff really changed any of `tables`.
    pub fn currently_diffing(&self, tables: &[&str]) -> bool {
        tables.iter().any(|t| self.last_diffed.contains(*t))
    }

    fn finish(&mut self, report: &ApplyReport) {
        self.last_diffed = report.tables().map(String::from).collect();
    }

    fn apply_nested(&mut self, diff: &Diff, report: &mut ApplyReport, depth: usize) -> Result<()> {
        let touched = self.commit(diff, report)?;
        if touched.is_empty() {
            return Ok(());
        }
        self.fire(&touched, report, depth)
    }

    /// Validates every table of the diff, then commits them. Returns the
    /// tables with real changes.
    fn commit(&mut self, diff: &Diff, report: &mut ApplyReport) -> Result<Vec<String>> {
        let mut resolved = Vec::new();
        for (name, changes) in diff.iter() {
            let r = match self.tables.get(name) {
                Some(table) => table.resolve(changes)?,
                None => Table::new(name).resolve(changes)?,
            };
            resolved.push((name, r));
        }

        let mut touched = Vec::new();
        for (name, r) in resolved {
            let table = self
                .tables
                .entry(name.to_string())
                .or_insert_with(|| Table::new(name));
            let changes = table.commit(r);
            if changes.is_empty() {
                continue;
            }
            tracing::debug!(
                table = name,
                adds = changes.adds.len(),
                removes = changes.removes.len(),
                "applied diff"
            );
            report.record(name, changes);
            touched.push(name.to_string());
        }
        Ok(touched)
    }

    // ---- triggers ----

    fn fire(&mut self, touched: &[String], report: &mut ApplyReport, depth: usize) -> Result<()> {
        for name in self.triggers.for_tables(touched) {
            self.fire_one(&name, report, depth)?;
        }
        Ok(())
    }

    fn fire_one(&mut self, name: &str, report: &mut ApplyReport, depth: usize) -> Result<()> {
        if self.active.iter().any(|active| active == name) {
            tracing::warn!(trigger = name, active = ?self.active, "cyclic trigger graph");
            return Err(Error::cyclic_trigger(name));
        }
        if depth >= self.config.max_trigger_depth {
            tracing::warn!(trigger = name, depth, "trigger cascade too deep");
            return Err(Error::trigger_depth_exceeded(name, depth));
        }
        let Some(query) = self.triggers.get(name).map(|t| Rc::clone(t.query())) else {
            return Ok(());
        };

        self.active.push(name.to_string());
        let result = self.run_trigger(name, &query, report, depth);
        self.active.pop();
        result
    }

    fn run_trigger(
        &mut self,
        name: &str,
        query: &Rc<RefCell<Query>>,
        report: &mut ApplyReport,
        depth: usize,
    ) -> Result<()> {
        tracing::debug!(trigger = name, depth, "firing trigger");
        report.fire(name);

        let plan = query.borrow_mut().compile(&self.functions)?;
        let result = plan.execute(&mut self.tables)?;

        if !self.config.materialize_views {
            return Ok(());
        }
        match result.into_projected() {
            Some(records) => self.materialize(name, records, report, depth),
            None => Ok(()),
        }
    }

    /// Replaces the view table's contents with `records` through one diff, so
    /// only the real difference reaches indexes and downstream triggers.
    fn materialize(
        &mut self,
        view: &str,
        records: Vec<Record>,
        report: &mut ApplyReport,
        depth: usize,
    ) -> Result<()> {
        let mut diff = Diff::new();
        diff.remove_many(view, self.facts(view));
        for record in records {
            diff.add_record(view, record);
        }
        self.apply_nested(&diff, report, depth + 1)
    }

    /// Registers and runs a trigger. If the first run fails, the previous
    /// trigger of that name (if any) is restored.
    fn install(&mut self, name: String, query: Query) -> Result<ApplyReport> {
        let mut query = query;
        query.compile(&self.functions)?;
        let previous = self
            .triggers
            .get(&name)
            .map(|t| t.query().borrow().clone());
        self.triggers.register(&name, query);

        let mut report = ApplyReport::default();
        let result = self.fire_one(&name, &mut report, 0);
        self.finish(&report);
        if result.is_err() {
            tracing::debug!(trigger = name.as_str(), "first run failed, unregistering");
            self.triggers.unregister(&name);
            if let Some(previous) = previous {
                self.triggers.register(&name, previous);
            }
        }
        result.map(|()| report)
    }

    /// Registers a named query as a trigger on every table it selects from
    /// and runs it once. Its output is not stored.
    pub fn add_trigger(&mut self, query: Query) -> Result<ApplyReport> {
        let name = query
            .name()
            .map(String::from)
            .ok_or_else(|| Error::invalid_operation("triggers require a named query"))?;
        self.install(name, query)
    }

    /// Registers a named, projected query as a view and materializes it into
    /// the table of the same name.
    ///
    /// The view table takes the projection's field names as its schema.
    pub fn as_view(&mut self, query: Query) -> Result<ApplyReport> {
        let name = query
            .name()
            .map(String::from)
            .ok_or_else(|| Error::invalid_operation("views require a named query"))?;
        let fields = query
            .projection_fields()
            .ok_or_else(|| Error::missing_projection(&name))?;
        let created = !self.has_table(&name);
        self.add_table(&name, &fields)?;
        let result = self.install(name.clone(), query);
        if result.is_err() && created {
            self.tables.remove(&name);
        }
        result
    }

    /// Unregisters a trigger or view. The view table keeps its facts.
    pub fn remove_view(&mut self, name: &str) -> bool {
        self.triggers.unregister(name)
    }

    /// Returns true if a trigger or view is registered under `name`.
    pub fn has_view(&self, name: &str) -> bool {
        self.triggers.get(name).is_some()
    }

    /// Returns the registered trigger and view names, sorted.
    pub fn views(&self) -> Vec<&str> {
        self.triggers.names()
    }

    /// Returns the trigger registry.
    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    // ---- queries ----

    /// Starts a named query.
    pub fn query(&self, name: &str) -> Query {
        Query::named(name)
    }

    /// Runs a query against the current tables, outside the trigger system.
    pub fn exec(&mut self, query: &mut Query) -> Result<QueryResult> {
        let plan = query.compile(&self.functions)?;
        plan.execute(&mut self.tables)
    }

    // ---- indexes ----

    /// Returns the index of `kind` over `keys`, creating it on first request.
    ///
    /// For `lookup`, the last key is the value position.
    pub fn index(&mut self, table: &str, kind: &str, keys: &[usize]) -> Result<&FactIndex> {
        let spec = IndexSpec::parse(kind, keys)?;
        self.index_spec(table, &spec)
    }

    /// Returns the index described by `spec`, creating it on first request.
    /// A missing table is created empty.
    pub fn index_spec(&mut self, table: &str, spec: &IndexSpec) -> Result<&FactIndex> {
        let store = self
            .tables
            .entry(table.to_string())
            .or_insert_with(|| Table::new(table));
        if !store.has_index(spec) {
            tracing::debug!(table, index = %spec, "generating index");
        }
        store.ensure_index(spec)
    }

    /// Returns true if the index exists.
    pub fn has_index(&self, table: &str, spec: &IndexSpec) -> bool {
        self.tables
            .get(table)
            .map(|t| t.has_index(spec))
            .unwrap_or(false)
    }

    /// Drops an index. Returns true if it existed.
    pub fn remove_index(&mut self, table: &str, spec: &IndexSpec) -> bool {
        self.tables
            .get_mut(table)
            .map(|t| t.remove_index(spec))
            .unwrap_or(false)
    }

    /// Names an index so it can be fetched with [`Indexer::index_alias`].
    /// The index itself is built on first fetch.
    pub fn add_alias(&mut self, name: &str, table: &str, kind: &str, keys: &[usize]) -> Result<()> {
        let spec = IndexSpec::parse(kind, keys)?;
        self.aliases
            .insert(name.to_string(), (table.to_string(), spec));
        Ok(())
    }

    /// Forgets an alias. The index stays. Returns true if the alias existed.
    pub fn remove_alias(&mut self, name: &str) -> bool {
        self.aliases.remove(name).is_some()
    }

    /// Returns the index behind an alias.
    pub fn index_alias(&mut self, name: &str) -> Result<&FactIndex> {
        let (table, spec) = self
            .aliases
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_index_alias(name))?;
        self.index_spec(&table, &spec)
    }

    // ---- reads ----

    /// Returns the facts of a table in insertion order. A missing table is empty.
    pub fn facts(&self, table: &str) -> Vec<Fact> {
        DataSource::facts(&self.tables, table)
    }

    /// Returns the facts of a table as records named by its schema.
    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .get(table)
            .map(|t| t.facts().map(|f| t.record(f)).collect())
            .unwrap_or_default()
    }

    /// Returns the earliest inserted fact still present.
    pub fn first(&self, table: &str) -> Option<Fact> {
        self.tables.get(table).and_then(Table::first).cloned()
    }

    /// Returns the latest inserted fact still present.
    pub fn last(&self, table: &str) -> Option<Fact> {
        self.tables.get(table).and_then(Table::last).cloned()
    }

    /// Returns the facts whose named fields equal the pattern. An empty
    /// pattern matches every fact.
    pub fn find(&self, table: &str, pattern: &Record) -> Result<Vec<Fact>> {
        match self.tables.get(table) {
            Some(store) => {
                let pattern = store.pattern(pattern)?;
                Ok(store.find(&pattern))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Returns the first fact matching the pattern.
    pub fn find_one(&self, table: &str, pattern: &Record) -> Result<Option<Fact>> {
        Ok(self.find(table, pattern)?.into_iter().next())
    }
}

#[cfg(feature = "builtins")]
fn default_functions() -> FunctionRegistry {
    FunctionRegistry::with_builtins()
}

#[cfg(not(feature = "builtins"))]
fn default_functions() -> FunctionRegistry {
    FunctionRegistry::new()
}

impl FactLookup for Indexer {
    fn find(&self, table: &str, pattern: &Record) -> Result<Vec<Fact>> {
        Indexer::find(self, table, pattern)
    }
}

impl DataSource for Indexer {
    fn fields(&self, table: &str) -> Option<Vec<String>> {
        self.tables.fields(table)
    }

    fn facts(&self, table: &str) -> Vec<Fact> {
        Indexer::facts(self, table)
    }

    fn find(&mut self, table: &str, pattern: &[(usize, Value)]) -> Result<Vec<Fact>> {
        DataSource::find(&mut self.tables, table, pattern)
    }
}
