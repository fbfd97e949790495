//! Tree-walking execution of a compiled plan.
//!
//! Execution first binds the plan against the source, mapping field names
//! to positions with the current table schemas, then runs the nested loop.
//! Grouping, aggregates, sorting, the limit and the projection apply to the
//! rows the loop produced, in that order.

use crate::function::FunctionBody;
use crate::plan::{AggregateOp, Op, Operand, Plan};
use crate::result::{QueryResult, Slot};
use crate::source::DataSource;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use factview_core::{Error, Record, Result, Value};
use factview_index::{compare_keys, Order};
use hashbrown::HashMap;

/// An operand with field names resolved.
#[derive(Clone, Debug)]
enum Bound {
    Literal(Value),
    Field(usize, usize),
    Slot(usize),
}

impl Bound {
    fn eval(&self, row: &[Slot]) -> Value {
        match self {
            Bound::Literal(value) => value.clone(),
            Bound::Field(slot, position) => match &row[*slot] {
                Slot::Fact(fact) => fact.get_or_null(*position),
                _ => Value::Null,
            },
            Bound::Slot(slot) => match &row[*slot] {
                Slot::Value(value) => value.clone(),
                _ => Value::Null,
            },
        }
    }
}

enum Level<'p> {
    Scan {
        slot: usize,
        table: &'p str,
        pattern: Vec<(usize, Bound)>,
    },
    Call {
        slot: usize,
        body: &'p FunctionBody,
        args: Vec<Bound>,
    },
}

struct Binder<'p> {
    plan: &'p Plan,
    fields: Vec<Option<Vec<String>>>,
}

impl<'p> Binder<'p> {
    fn new<S: DataSource + ?Sized>(plan: &'p Plan, source: &S) -> Self {
        let fields = plan
            .slot_tables
            .iter()
            .map(|table| table.as_deref().and_then(|t| source.fields(t)))
            .collect();
        Self { plan, fields }
    }

    fn position(&self, slot: usize, field: &str) -> Result<Option<usize>> {
        match &self.fields[slot] {
            Some(fields) => fields
                .iter()
                .position(|f| f == field)
                .map(Some)
                .ok_or_else(|| {
                    let table = self.plan.slot_tables[slot].as_deref().unwrap_or_default();
                    Error::unknown_field(table, field)
                }),
            // Missing table: its loop never binds a fact.
            None => Ok(None),
        }
    }

    fn operand(&self, operand: &Operand) -> Result<Bound> {
        Ok(match operand {
            Operand::Literal(value) => Bound::Literal(value.clone()),
            Operand::Field { slot, field } => match self.position(*slot, field)? {
                Some(position) => Bound::Field(*slot, position),
                None => Bound::Literal(Value::Null),
            },
            Operand::Slot(slot) => Bound::Slot(*slot),
        })
    }

    fn operands(&self, operands: &[Operand]) -> Result<Vec<Bound>> {
        operands.iter().map(|o| self.operand(o)).collect()
    }

    fn level(&self, op: &'p Op) -> Result<Level<'p>> {
        Ok(match op {
            Op::Scan { slot, table, join } => {
                let mut pattern = Vec::with_capacity(join.len());
                for (field, operand) in join {
                    if let Some(position) = self.position(*slot, field)? {
                        pattern.push((position, self.operand(operand)?));
                    }
                }
                Level::Scan {
                    slot: *slot,
                    table,
                    pattern,
                }
            }
            Op::Call {
                slot,
                function,
                args,
            } => Level::Call {
                slot: *slot,
                body: function.body(),
                args: self.operands(args)?,
            },
        })
    }
}

struct Runner<'p, 's, S: ?Sized> {
    levels: Vec<Level<'p>>,
    source: &'s mut S,
    rows: Vec<Vec<Slot>>,
}

impl<S: DataSource + ?Sized> Runner<'_, '_, S> {
    fn run(&mut self, depth: usize, row: &mut Vec<Slot>) -> Result<()> {
        let Some(level) = self.levels.get(depth) else {
            self.rows.push(row.clone());
            return Ok(());
        };
        match level {
            Level::Scan {
                slot,
                table,
                pattern,
            } => {
                let slot = *slot;
                let candidates = if pattern.is_empty() {
                    self.source.facts(table)
                } else {
                    let values: Vec<(usize, Value)> = pattern
                        .iter()
                        .map(|(position, bound)| (*position, bound.eval(row)))
                        .collect();
                    let table = *table;
                    self.source.find(table, &values)?
                };
                for fact in candidates {
                    row[slot] = Slot::Fact(fact);
                    self.run(depth + 1, row)?;
                }
                row[slot] = Slot::Empty;
            }
            Level::Call { slot, body, args } => {
                let slot = *slot;
                let values: Vec<Value> = args.iter().map(|a| a.eval(row)).collect();
                match body {
                    FunctionBody::Scalar(f) => {
                        row[slot] = Slot::Value(f(&values)?);
                        self.run(depth + 1, row)?;
                    }
                    FunctionBody::Multi(f) => {
                        for value in f(&values)? {
                            row[slot] = Slot::Value(value);
                            self.run(depth + 1, row)?;
                        }
                    }
                    FunctionBody::Filter(f) => {
                        if f(&values)? {
                            row[slot] = Slot::Value(Value::Boolean(true));
                            self.run(depth + 1, row)?;
                        }
                    }
                    FunctionBody::Effect(f) => {
                        f(&values)?;
                        self.run(depth + 1, row)?;
                    }
                    FunctionBody::Aggregate(_) => {
                        return Err(Error::invalid_operation("aggregate inside the row loop"))
                    }
                }
                row[slot] = Slot::Empty;
            }
        }
        Ok(())
    }
}

impl Plan {
    /// Runs the plan against `source`.
    pub fn execute<S: DataSource + ?Sized>(&self, source: &mut S) -> Result<QueryResult> {
        let binder = Binder::new(self, &*source);
        let levels = self
            .ops
            .iter()
            .map(|op| binder.level(op))
            .collect::<Result<Vec<_>>>()?;
        let mut aggregates = Vec::with_capacity(self.aggregates.len());
        for aggregate in &self.aggregates {
            aggregates.push((aggregate, binder.operands(&aggregate.args)?));
        }
        let groups = binder.operands(&self.groups)?;
        let sorts = self
            .sorts
            .iter()
            .map(|(operand, _)| binder.operand(operand))
            .collect::<Result<Vec<_>>>()?;
        let orders: Vec<Order> = self.sorts.iter().map(|(_, order)| *order).collect();
        let projection = match &self.projection {
            Some(projection) => {
                let mut bound = Vec::with_capacity(projection.len());
                for (name, operand) in projection {
                    bound.push((name.as_str(), binder.operand(operand)?));
                }
                Some(bound)
            }
            None => None,
        };

        let mut runner = Runner {
            levels,
            source,
            rows: Vec::new(),
        };
        let mut row = vec![Slot::Empty; self.slots];
        runner.run(0, &mut row)?;
        let mut rows = runner.rows;

        if !aggregates.is_empty() || !groups.is_empty() {
            rows = group_rows(rows, &groups, &aggregates)?;
        }

        if !sorts.is_empty() {
            let mut keyed: Vec<(Vec<Value>, Vec<Slot>)> = rows
                .into_iter()
                .map(|row| (sorts.iter().map(|s| s.eval(&row)).collect(), row))
                .collect();
            keyed.sort_by(|a, b| compare_keys(&a.0, &b.0, &orders));
            rows = keyed.into_iter().map(|(_, row)| row).collect();
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }

        let projected = projection.map(|projection| {
            rows.iter()
                .map(|row| {
                    projection
                        .iter()
                        .map(|(name, bound)| (*name, bound.eval(row)))
                        .collect::<Record>()
                })
                .collect::<Vec<Record>>()
        });

        Ok(QueryResult { rows, projected })
    }
}

/// Collapses rows to one per distinct group key, in first-seen order, and
/// binds each aggregate over its group. Without group keys every row is in
/// one group; no rows means no groups.
fn group_rows(
    rows: Vec<Vec<Slot>>,
    groups: &[Bound],
    aggregates: &[(&AggregateOp, Vec<Bound>)],
) -> Result<Vec<Vec<Slot>>> {
    let mut order: Vec<Vec<usize>> = Vec::new();
    let mut seen: HashMap<Vec<Value>, usize> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        let key: Vec<Value> = groups.iter().map(|g| g.eval(row)).collect();
        match seen.get(&key) {
            Some(&group) => order[group].push(i),
            None => {
                seen.insert(key, order.len());
                order.push(vec![i]);
            }
        }
    }

    let mut out = Vec::with_capacity(order.len());
    for members in order {
        let mut representative = rows[members[0]].clone();
        for (aggregate, args) in aggregates {
            let columns: Vec<Vec<Value>> = args
                .iter()
                .map(|arg| members.iter().map(|&i| arg.eval(&rows[i])).collect())
                .collect();
            let value = match aggregate.function.body() {
                FunctionBody::Aggregate(f) => f(&columns)?,
                _ => {
                    return Err(Error::invalid_operation(format!(
                        "'{}' is not an aggregate",
                        aggregate.function.name()
                    )))
                }
            };
            representative[aggregate.slot] = Slot::Value(value);
        }
        out.push(representative);
    }
    Ok(out)
}
