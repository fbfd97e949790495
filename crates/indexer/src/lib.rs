//! Factview Indexer - The incremental fact indexer engine.
//!
//! This crate ties the lower layers together:
//!
//! - `Indexer`: owns tables, applies diffs, serves indexes and reads
//! - `TriggerRegistry`: named queries re-run when a table they read changes
//! - `ApplyReport`: the real changes and fired triggers of one application
//! - `IndexerConfig`: cascade depth bound and view materialization switch
//!
//! Views are triggers with a projection. Each time one fires, its projected
//! records replace the contents of the table named after it, and only the
//! real difference is applied, so views of views stay incremental.
//!
//! # Example
//!
//! ```rust
//! use factview_core::{Record, Value};
//! use factview_indexer::Indexer;
//! use factview_query::field;
//!
//! let mut indexer = Indexer::new();
//! let mut diff = indexer.diff();
//! diff.add_record("people", Record::new().with("name", "alice").with("age", 30i64))
//!     .add_record("people", Record::new().with("name", "bob").with("age", 25i64));
//! indexer.apply_diff(&diff).unwrap();
//!
//! let mut older = indexer
//!     .query("older")
//!     .select("people", vec![])
//!     .calculate(">", vec![("a", field(0, "age")), ("b", 26i64.into())])
//!     .project(vec![("who", field(0, "name"))]);
//! let result = indexer.exec(&mut older).unwrap();
//! assert_eq!(result.projected().unwrap(), &[Record::new().with("who", "alice")]);
//!
//! let bob = indexer
//!     .find_one("people", &Record::new().with("name", "bob"))
//!     .unwrap();
//! assert_eq!(bob.and_then(|f| f.get(1).cloned()), Some(Value::Int64(25)));
//! ```

#![no_std]

extern crate alloc;

pub mod config;
pub mod indexer;
pub mod report;
pub mod trigger;

pub use config::IndexerConfig;
pub use indexer::Indexer;
pub use report::ApplyReport;
pub use trigger::{Trigger, TriggerRegistry};
