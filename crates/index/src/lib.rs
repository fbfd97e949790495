//! Factview Index - Incrementally maintained indexes over facts.
//!
//! This crate provides the three index kinds a table can carry:
//!
//! - `LookupIndex`: key tuple → single value (or whole fact), last write wins
//! - `CollectorIndex`: key tuple → bucket of facts, nested one map level per key
//! - `SorterIndex`: one list of facts totally ordered by a list of sort keys
//!
//! Every index is described by an `IndexSpec` (kind + key positions) whose
//! type tag (`"collector<0,1>"`) identifies it in a table's index cache, and is
//! maintained through `FactIndex::apply` with the real adds/removes of a diff.
//!
//! # Example
//!
//! ```rust
//! use factview_core::{Fact, Value};
//! use factview_index::{IndexSpec, FactIndex};
//!
//! let spec = IndexSpec::collector(vec![1]);
//! assert_eq!(spec.tag(), "collector<1>");
//!
//! let mut index = FactIndex::new(spec);
//! let alice = Fact::from(vec![Value::from("alice"), Value::from(30i64)]);
//! let bob = Fact::from(vec![Value::from("bob"), Value::from(30i64)]);
//! index.apply(&[alice.clone(), bob.clone()], &[]);
//!
//! let collector = index.as_collector().unwrap();
//! assert_eq!(collector.get(&[Value::from(30i64)]), &[alice.clone(), bob][..]);
//!
//! index.apply(&[], &[alice]);
//! assert_eq!(index.len(), 1);
//! ```

#![no_std]

extern crate alloc;

pub mod collector;
pub mod comparator;
pub mod lookup;
pub mod sorter;
pub mod spec;
pub mod traits;
pub mod tree;

pub use collector::CollectorIndex;
pub use comparator::{compare_keys, FactComparator, Order};
pub use lookup::{LookupEntry, LookupIndex};
pub use sorter::SorterIndex;
pub use spec::{IndexKind, IndexSpec, LookupValue};
pub use traits::{FactIndex, IndexMaintainer};
pub use tree::{KeyNode, KeyTree};
