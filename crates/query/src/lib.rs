//! Factview Query - Query builder, compiler and executor.
//!
//! This crate turns a declarative description of joins, function calls,
//! aggregates and a projection into a nested-loop plan:
//!
//! - `Query`: the fluent builder; caches its compiled plan until changed
//! - `FunctionRegistry`: named functions with declared parameters
//! - `Plan`: loop levels in execution order, with calls hoisted to the
//!   earliest level where their arguments are bound
//! - `DataSource`: the seam to table storage; missing tables read as empty
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use factview_core::{Fact, Value};
//! use factview_query::{field, FunctionRegistry, Query, Term};
//! use factview_storage::Table;
//!
//! let mut people = Table::with_fields("people", vec!["name".into(), "age".into()]);
//! people
//!     .update(
//!         &[
//!             Fact::from(vec![Value::from("alice"), Value::from(30i64)]),
//!             Fact::from(vec![Value::from("tim"), Value::from(12i64)]),
//!         ],
//!         &[],
//!     )
//!     .unwrap();
//! let mut tables = BTreeMap::new();
//! tables.insert(String::from("people"), people);
//!
//! let functions = FunctionRegistry::with_builtins();
//! let mut query = Query::new()
//!     .select("people", vec![])
//!     .calculate(">", vec![("a", field(0, "age")), ("b", Term::from(18i64))])
//!     .project(vec![("name", field(0, "name"))]);
//!
//! let result = query.exec(&functions, &mut tables).unwrap();
//! let names: Vec<_> = result.projected().unwrap().iter().map(|r| r.get("name").cloned()).collect();
//! assert_eq!(names, vec![Some(Value::from("alice"))]);
//! assert_eq!(query.compile_count(), 1);
//! ```

#![no_std]

extern crate alloc;

pub mod builtins;
pub mod execute;
pub mod function;
pub mod plan;
pub mod query;
pub mod result;
pub mod source;
pub mod term;

pub use function::{FunctionBody, FunctionDef, FunctionKind, FunctionRegistry};
pub use plan::{AggregateOp, Op, Operand, Plan};
pub use query::{Query, Step};
pub use result::{QueryResult, Slot};
pub use source::DataSource;
pub use term::{field, result, Source, Term};
