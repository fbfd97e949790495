//! Factview Storage - Fact tables and diffs.
//!
//! This crate provides the mutation layer of the indexer:
//!
//! - `Diff`: adds and removes across many tables, the only way data changes
//! - `Table`: a deduplicated set of facts with a schema and its live indexes
//! - `NetCounts`: per-fact net multiplicity used to turn a diff into real changes
//!
//! # Example
//!
//! ```rust
//! use factview_core::{Fact, Value};
//! use factview_storage::{Diff, Table};
//!
//! let mut table = Table::new("people");
//! let alice = Fact::from(vec![Value::from("alice"), Value::from(30i64)]);
//!
//! let mut diff = Diff::new();
//! diff.add("people", alice.clone()).add("people", alice.clone());
//!
//! let resolved = table.resolve(diff.get("people").unwrap()).unwrap();
//! let changes = table.commit(resolved);
//! assert_eq!(changes.adds, vec![alice]);
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.fields().unwrap(), &["0", "1"]);
//! ```

#![no_std]

extern crate alloc;

pub mod consolidate;
pub mod diff;
pub mod table;

pub use consolidate::NetCounts;
pub use diff::{Diff, FactLookup, Row, TableDiff};
pub use table::{Changes, Resolved, Table};
