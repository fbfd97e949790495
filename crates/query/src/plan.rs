//! Compilation of a query into an executable plan.
//!
//! The plan is a flat list of loop levels. Selects keep their builder order;
//! each function call is hoisted to run directly after the last select its
//! arguments depend on, so filters prune as early as possible. Aggregates
//! are not loop levels: they run once per group after the loop.
//!
//! Slots are numbered by builder position, so a result row can be indexed
//! with the same numbers used for back-references.

use crate::function::{FunctionDef, FunctionKind, FunctionRegistry};
use crate::query::{Query, Step};
use crate::term::{Source, Term};
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use factview_core::{Error, Result, Value};
use factview_index::Order;

/// A compiled term.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A literal.
    Literal(Value),
    /// A named field of the fact bound in a select slot. Field names are
    /// mapped to positions when the plan executes.
    Field {
        /// Select slot.
        slot: usize,
        /// Field name.
        field: String,
    },
    /// The value bound in a function slot.
    Slot(usize),
}

impl Operand {
    fn slot(&self) -> Option<usize> {
        match self {
            Operand::Literal(_) => None,
            Operand::Field { slot, .. } | Operand::Slot(slot) => Some(*slot),
        }
    }
}

/// One loop level.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Bind each matching fact of `table`.
    Scan {
        /// Slot bound by this level.
        slot: usize,
        /// Table name.
        table: String,
        /// Field name → value the fact must have there.
        join: Vec<(String, Operand)>,
    },
    /// Call a function with arguments in parameter order.
    Call {
        /// Slot bound by this level.
        slot: usize,
        /// The resolved function.
        function: Rc<FunctionDef>,
        /// Arguments in parameter order.
        args: Vec<Operand>,
    },
}

impl Op {
    /// Returns the slot this level binds.
    pub fn slot(&self) -> usize {
        match self {
            Op::Scan { slot, .. } | Op::Call { slot, .. } => *slot,
        }
    }
}

/// An aggregate evaluated after the loop.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateOp {
    /// Slot the aggregate value is bound to.
    pub slot: usize,
    /// The resolved aggregate.
    pub function: Rc<FunctionDef>,
    /// Arguments in parameter order, evaluated per row.
    pub args: Vec<Operand>,
}

/// An executable query plan.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub(crate) slots: usize,
    pub(crate) slot_tables: Vec<Option<String>>,
    pub(crate) ops: Vec<Op>,
    pub(crate) aggregates: Vec<AggregateOp>,
    pub(crate) groups: Vec<Operand>,
    pub(crate) sorts: Vec<(Operand, Order)>,
    pub(crate) limit: Option<usize>,
    pub(crate) projection: Option<Vec<(String, Operand)>>,
}

#[derive(Clone, Copy, PartialEq)]
enum SlotKind {
    Select,
    Call,
    Aggregate,
}

struct Compiler<'a> {
    functions: &'a FunctionRegistry,
    kinds: Vec<SlotKind>,
    aliases: Vec<Option<String>>,
}

impl Compiler<'_> {
    /// Resolves a source visible to step `visible` (exclusive).
    fn source(&self, source: &Source, visible: usize) -> Result<usize> {
        match source {
            Source::Step(step) if *step < visible => Ok(*step),
            Source::Step(step) => Err(Error::unknown_alias(step.to_string())),
            Source::Alias(alias) => self.aliases[..visible]
                .iter()
                .rposition(|a| a.as_deref() == Some(alias.as_str()))
                .ok_or_else(|| Error::unknown_alias(alias.as_str())),
        }
    }

    /// Compiles a term evaluated inside the loop, where aggregate slots are
    /// not yet bound.
    fn row_term(&self, term: &Term, visible: usize) -> Result<Operand> {
        let operand = self.term(term, visible)?;
        if let Some(slot) = operand.slot() {
            if self.kinds[slot] == SlotKind::Aggregate {
                return Err(Error::invalid_operation(format!(
                    "aggregate at step {} can only be used in projections and sort keys",
                    slot
                )));
            }
        }
        Ok(operand)
    }

    fn term(&self, term: &Term, visible: usize) -> Result<Operand> {
        match term {
            Term::Value(value) => Ok(Operand::Literal(value.clone())),
            Term::Ref { source, field } => {
                let slot = self.source(source, visible)?;
                match (self.kinds[slot], field) {
                    (SlotKind::Select, Some(field)) => Ok(Operand::Field {
                        slot,
                        field: field.clone(),
                    }),
                    (SlotKind::Select, None) => Err(Error::invalid_operation(format!(
                        "reference to select {} needs a field",
                        slot
                    ))),
                    (_, None) => Ok(Operand::Slot(slot)),
                    (_, Some(field)) => Err(Error::unknown_field(
                        format!("step {}", slot),
                        field.as_str(),
                    )),
                }
            }
        }
    }

    fn function(&self, name: &str, aggregate: bool) -> Result<Rc<FunctionDef>> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| Error::unknown_function(name))?;
        if aggregate && function.kind() != FunctionKind::Aggregate {
            return Err(Error::invalid_operation(format!(
                "'{}' is not an aggregate",
                name
            )));
        }
        Ok(function)
    }

    fn args(
        &self,
        function: &FunctionDef,
        args: &[(String, Term)],
        visible: usize,
    ) -> Result<Vec<Operand>> {
        if let Some((extra, _)) = args
            .iter()
            .find(|(name, _)| !function.params().contains(name))
        {
            return Err(Error::invalid_operation(format!(
                "function '{}' has no parameter '{}'",
                function.name(),
                extra
            )));
        }
        function
            .params()
            .iter()
            .map(|param| {
                let (_, term) = args
                    .iter()
                    .find(|(name, _)| name == param)
                    .ok_or_else(|| Error::missing_argument(function.name(), param.as_str()))?;
                self.row_term(term, visible)
            })
            .collect()
    }
}

impl Plan {
    /// Compiles a query against a function registry.
    ///
    /// Fails on an unknown alias or function, a missing or unknown argument,
    /// or an aggregate used where rows are still being produced.
    pub fn compile(query: &Query, functions: &FunctionRegistry) -> Result<Self> {
        let steps = query.steps();
        let mut compiler = Compiler {
            functions,
            kinds: Vec::with_capacity(steps.len()),
            aliases: steps.iter().map(|s| s.alias().map(String::from)).collect(),
        };

        // Resolve every function first so slot kinds are known.
        let mut resolved: Vec<Option<Rc<FunctionDef>>> = Vec::with_capacity(steps.len());
        for step in steps {
            match step {
                Step::Select { .. } => {
                    compiler.kinds.push(SlotKind::Select);
                    resolved.push(None);
                }
                Step::Call {
                    function,
                    aggregate,
                    ..
                } => {
                    let def = compiler.function(function, *aggregate)?;
                    compiler.kinds.push(if def.kind() == FunctionKind::Aggregate {
                        SlotKind::Aggregate
                    } else {
                        SlotKind::Call
                    });
                    resolved.push(Some(def));
                }
            }
        }

        let mut levels: Vec<Option<Op>> = Vec::with_capacity(steps.len());
        let mut aggregates = Vec::new();
        let mut slot_tables = Vec::with_capacity(steps.len());
        // Select slot after which each step can run; None runs before any select.
        let mut anchors: Vec<Option<usize>> = Vec::with_capacity(steps.len());

        for (slot, (step, def)) in steps.iter().zip(resolved).enumerate() {
            match (step, def) {
                (Step::Select { table, join, .. }, _) => {
                    let join = join
                        .iter()
                        .map(|(field, term)| -> Result<(String, Operand)> {
                            Ok((field.clone(), compiler.row_term(term, slot)?))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    slot_tables.push(Some(table.clone()));
                    anchors.push(Some(slot));
                    levels.push(Some(Op::Scan {
                        slot,
                        table: table.clone(),
                        join,
                    }));
                }
                (Step::Call { args, .. }, Some(function)) => {
                    let args = compiler.args(&function, args, slot)?;
                    slot_tables.push(None);
                    if function.kind() == FunctionKind::Aggregate {
                        anchors.push(None);
                        levels.push(None);
                        aggregates.push(AggregateOp {
                            slot,
                            function,
                            args,
                        });
                    } else {
                        let anchor = args
                            .iter()
                            .filter_map(Operand::slot)
                            .filter_map(|dep| anchors[dep])
                            .max();
                        anchors.push(anchor);
                        levels.push(Some(Op::Call {
                            slot,
                            function,
                            args,
                        }));
                    }
                }
                (Step::Call { function, .. }, None) => {
                    return Err(Error::unknown_function(function.as_str()));
                }
            }
        }

        let ops = hoist(levels, &anchors, &compiler.kinds);

        let visible = steps.len();
        let groups = query
            .groups()
            .iter()
            .map(|term| compiler.row_term(term, visible))
            .collect::<Result<Vec<_>>>()?;
        let sorts = query
            .sorts()
            .iter()
            .map(|(term, order)| -> Result<(Operand, Order)> {
                Ok((compiler.term(term, visible)?, *order))
            })
            .collect::<Result<Vec<_>>>()?;
        let projection = match query.projection() {
            Some(projection) => {
                for (i, (name, _)) in projection.iter().enumerate() {
                    if projection[..i].iter().any(|(earlier, _)| earlier == name) {
                        return Err(Error::invalid_operation(format!(
                            "projection field '{}' is declared twice",
                            name
                        )));
                    }
                }
                Some(
                    projection
                        .iter()
                        .map(|(name, term)| -> Result<(String, Operand)> {
                            Ok((name.clone(), compiler.term(term, visible)?))
                        })
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            None => None,
        };

        tracing::trace!(
            query = query.name().unwrap_or("<anonymous>"),
            steps = steps.len(),
            levels = ops.len(),
            aggregates = aggregates.len(),
            "compiled query"
        );

        Ok(Self {
            slots: steps.len(),
            slot_tables,
            ops,
            aggregates,
            groups,
            sorts,
            limit: query.row_limit(),
            projection,
        })
    }

    /// Returns the loop levels in execution order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Returns the aggregates.
    pub fn aggregates(&self) -> &[AggregateOp] {
        &self.aggregates
    }

    /// Returns the number of slots in a result row.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Returns the projected field names, if the plan projects.
    pub fn projection_fields(&self) -> Option<Vec<&str>> {
        self.projection
            .as_ref()
            .map(|p| p.iter().map(|(name, _)| name.as_str()).collect())
    }
}

/// Orders loop levels: unanchored calls first, then each select followed by
/// the calls anchored on it, keeping builder order within a group.
fn hoist(levels: Vec<Option<Op>>, anchors: &[Option<usize>], kinds: &[SlotKind]) -> Vec<Op> {
    let mut by_anchor: Vec<Vec<Op>> = (0..levels.len()).map(|_| Vec::new()).collect();
    let mut selects: Vec<Option<Op>> = (0..levels.len()).map(|_| None).collect();
    let mut ops = Vec::with_capacity(levels.len());

    for (slot, level) in levels.into_iter().enumerate() {
        let Some(op) = level else { continue };
        match (kinds[slot], anchors[slot]) {
            (SlotKind::Select, _) => selects[slot] = Some(op),
            (_, Some(anchor)) => by_anchor[anchor].push(op),
            (_, None) => ops.push(op),
        }
    }
    for (select, calls) in selects.into_iter().zip(by_anchor) {
        if let Some(select) = select {
            ops.push(select);
        }
        ops.extend(calls);
    }
    ops
}
