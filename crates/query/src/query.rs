//! The fluent query builder.

use crate::function::FunctionRegistry;
use crate::plan::Plan;
use crate::result::QueryResult;
use crate::source::DataSource;
use crate::term::Term;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use factview_core::Result;
use factview_index::Order;

/// One select or function call, in builder order.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Iterate the facts of a table matching the join predicate.
    Select {
        /// Table name.
        table: String,
        /// Field name → bound term.
        join: Vec<(String, Term)>,
        /// Optional alias.
        alias: Option<String>,
    },
    /// Apply a registered function.
    Call {
        /// Function name.
        function: String,
        /// Parameter name → bound term.
        args: Vec<(String, Term)>,
        /// Optional alias.
        alias: Option<String>,
        /// Added through `aggregate`, which requires an aggregate function.
        aggregate: bool,
    },
}

impl Step {
    /// Returns the alias of this step.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Step::Select { alias, .. } | Step::Call { alias, .. } => alias.as_deref(),
        }
    }
}

/// A query under construction.
///
/// Every structural change discards the compiled plan; `exec` compiles at
/// most once between changes and always reads current table contents.
///
/// # Example
///
/// ```rust
/// use factview_query::{field, Query, Term};
///
/// let query = Query::named("adults")
///     .select("people", vec![])
///     .calculate(">", vec![("a", field(0, "age")), ("b", Term::from(18i64))])
///     .project(vec![("name", field(0, "name")), ("age", field(0, "age"))]);
///
/// assert_eq!(query.tables(), vec!["people"]);
/// assert!(query.is_dirty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Query {
    name: Option<String>,
    steps: Vec<Step>,
    groups: Vec<Term>,
    sorts: Vec<(Term, Order)>,
    limit: Option<usize>,
    projection: Option<Vec<(String, Term)>>,
    plan: Option<Rc<Plan>>,
    compile_count: usize,
}

fn owned(pairs: Vec<(&str, Term)>) -> Vec<(String, Term)> {
    pairs.into_iter().map(|(k, t)| (String::from(k), t)).collect()
}

impl Query {
    /// Creates an anonymous query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a named query. Only named queries can be installed as views;
    /// the name is also the view table.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(String::from(name)),
            ..Self::default()
        }
    }

    /// Returns the query name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self.plan = None;
        self
    }

    /// Appends a select. `join` maps field names to literals or references.
    pub fn select(self, table: &str, join: Vec<(&str, Term)>) -> Self {
        self.push(Step::Select {
            table: String::from(table),
            join: owned(join),
            alias: None,
        })
    }

    /// Appends an aliased select.
    pub fn select_as(self, table: &str, join: Vec<(&str, Term)>, alias: &str) -> Self {
        self.push(Step::Select {
            table: String::from(table),
            join: owned(join),
            alias: Some(String::from(alias)),
        })
    }

    /// Appends a function call. `args` maps parameter names to terms.
    pub fn calculate(self, function: &str, args: Vec<(&str, Term)>) -> Self {
        self.push(Step::Call {
            function: String::from(function),
            args: owned(args),
            alias: None,
            aggregate: false,
        })
    }

    /// Appends an aliased function call.
    pub fn calculate_as(self, function: &str, args: Vec<(&str, Term)>, alias: &str) -> Self {
        self.push(Step::Call {
            function: String::from(function),
            args: owned(args),
            alias: Some(String::from(alias)),
            aggregate: false,
        })
    }

    /// Appends an aggregate evaluated once per group.
    pub fn aggregate(self, function: &str, args: Vec<(&str, Term)>) -> Self {
        self.push(Step::Call {
            function: String::from(function),
            args: owned(args),
            alias: None,
            aggregate: true,
        })
    }

    /// Appends an aliased aggregate.
    pub fn aggregate_as(self, function: &str, args: Vec<(&str, Term)>, alias: &str) -> Self {
        self.push(Step::Call {
            function: String::from(function),
            args: owned(args),
            alias: Some(String::from(alias)),
            aggregate: true,
        })
    }

    /// Adds a grouping key. Output has one row per distinct key tuple.
    pub fn group(mut self, term: Term) -> Self {
        self.groups.push(term);
        self.plan = None;
        self
    }

    /// Adds a sort key for the output rows.
    pub fn sort(mut self, term: Term, order: Order) -> Self {
        self.sorts.push((term, order));
        self.plan = None;
        self
    }

    /// Keeps at most `n` output rows.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self.plan = None;
        self
    }

    /// Sets the output shape: field name → term.
    pub fn project(mut self, projection: Vec<(&str, Term)>) -> Self {
        self.projection = Some(owned(projection));
        self.plan = None;
        self
    }

    /// Returns the steps in builder order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the grouping keys.
    pub fn groups(&self) -> &[Term] {
        &self.groups
    }

    /// Returns the sort keys.
    pub fn sorts(&self) -> &[(Term, Order)] {
        &self.sorts
    }

    /// Returns the row limit.
    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the projection.
    pub fn projection(&self) -> Option<&[(String, Term)]> {
        self.projection.as_deref()
    }

    /// Returns the projected field names in order.
    pub fn projection_fields(&self) -> Option<Vec<&str>> {
        self.projection
            .as_ref()
            .map(|p| p.iter().map(|(name, _)| name.as_str()).collect())
    }

    /// Returns the distinct tables this query selects from, in first-use order.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for step in &self.steps {
            if let Step::Select { table, .. } = step {
                if !tables.contains(&table.as_str()) {
                    tables.push(table);
                }
            }
        }
        tables
    }

    /// Returns true when the next execution has to compile.
    pub fn is_dirty(&self) -> bool {
        self.plan.is_none()
    }

    /// Returns how many times this query has been compiled.
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Returns the cached plan, compiling it if the query changed.
    pub fn compile(&mut self, functions: &FunctionRegistry) -> Result<Rc<Plan>> {
        if let Some(plan) = &self.plan {
            return Ok(Rc::clone(plan));
        }
        let plan = Rc::new(Plan::compile(self, functions)?);
        self.compile_count += 1;
        self.plan = Some(Rc::clone(&plan));
        Ok(plan)
    }

    /// Compiles if needed and runs against `source`.
    pub fn exec<S: DataSource + ?Sized>(
        &mut self,
        functions: &FunctionRegistry,
        source: &mut S,
    ) -> Result<QueryResult> {
        let plan = self.compile(functions)?;
        plan.execute(source)
    }
}
