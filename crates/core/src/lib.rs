//! Factview Core - Core types for the factview fact indexer.
//!
//! This crate provides the foundational types shared by every layer:
//!
//! - `Value`: Scalar values that can appear in a fact (null, boolean, integer, float, string)
//! - `Fact`: An immutable, cheaply clonable ordered tuple of values
//! - `Record`: An ordered list of named values (projection output, record-shaped diffs)
//! - `Error`: Error types for indexer and query operations
//!
//! # Example
//!
//! ```rust
//! use factview_core::{Fact, Record, Value};
//!
//! let fact = Fact::from(vec![Value::from("alice"), Value::from(30i64)]);
//! assert_eq!(fact.len(), 2);
//! assert_eq!(fact.get(0), Some(&Value::String("alice".into())));
//!
//! let record = Record::new().with("name", "alice").with("age", 30i64);
//! assert_eq!(record.get("age"), Some(&Value::Int64(30)));
//! assert_eq!(record.to_fact(), fact);
//! ```

#![no_std]

extern crate alloc;

mod error;
mod fact;
mod record;
mod value;

pub use error::{Error, Result};
pub use fact::{positional_fields, Fact};
pub use record::Record;
pub use value::Value;
