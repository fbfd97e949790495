//! Error types for the factview indexer.

use alloc::string::String;
use core::fmt;

/// Result type alias for factview operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for indexer and query operations.
///
/// Every variant is a configuration or usage error. Absence of data (missing
/// tables, empty buckets) is never reported through this type.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// An index kind other than `lookup`, `collector` or `sorter` was requested.
    UnknownIndexKind {
        kind: String,
    },
    /// A named index alias was used before being registered.
    UnknownIndexAlias {
        name: String,
    },
    /// An index request was missing its table, kind or keys.
    AmbiguousIndex {
        message: String,
    },
    /// A query referenced a select or function alias that does not exist.
    UnknownAlias {
        alias: String,
    },
    /// A query called a function that is not in the registry.
    UnknownFunction {
        name: String,
    },
    /// A function call did not bind one of the function's declared parameters.
    MissingArgument {
        function: String,
        param: String,
    },
    /// A field name is not part of the table (or record) schema.
    UnknownField {
        table: String,
        field: String,
    },
    /// A fact's arity differs from the table's established schema.
    ArityMismatch {
        table: String,
        expected: usize,
        got: usize,
    },
    /// A builtin function received operands it cannot combine.
    TypeMismatch {
        op: String,
        left: &'static str,
        right: &'static str,
    },
    /// A trigger was re-entered while it was already executing.
    CyclicTrigger {
        trigger: String,
    },
    /// Trigger cascades nested deeper than the configured bound.
    TriggerDepthExceeded {
        trigger: String,
        depth: usize,
    },
    /// A view was installed from a query that has no name or no projection.
    MissingProjection {
        query: String,
    },
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownIndexKind { kind } => {
                write!(f, "Unknown indexer of kind: '{}'", kind)
            }
            Error::UnknownIndexAlias { name } => {
                write!(f, "Alias: '{}' does not exist", name)
            }
            Error::AmbiguousIndex { message } => {
                write!(f, "Cannot retrieve ambiguous index: {}", message)
            }
            Error::UnknownAlias { alias } => {
                write!(f, "Invalid alias used: {}", alias)
            }
            Error::UnknownFunction { name } => {
                write!(f, "Unknown function: '{}'", name)
            }
            Error::MissingArgument { function, param } => {
                write!(f, "Function '{}' is missing argument '{}'", function, param)
            }
            Error::UnknownField { table, field } => {
                write!(f, "Field '{}' not found in '{}'", field, table)
            }
            Error::ArityMismatch {
                table,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Arity mismatch in table '{}': expected {} fields, got {}",
                    table, expected, got
                )
            }
            Error::TypeMismatch { op, left, right } => {
                write!(f, "Type mismatch in '{}': {} and {}", op, left, right)
            }
            Error::CyclicTrigger { trigger } => {
                write!(f, "Cyclic trigger graph detected at trigger '{}'", trigger)
            }
            Error::TriggerDepthExceeded { trigger, depth } => {
                write!(
                    f,
                    "Trigger cascade exceeded depth {} at trigger '{}'",
                    depth, trigger
                )
            }
            Error::MissingProjection { query } => {
                write!(f, "Query '{}' cannot be materialized without a projection", query)
            }
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates an unknown index kind error.
    pub fn unknown_index_kind(kind: impl Into<String>) -> Self {
        Error::UnknownIndexKind { kind: kind.into() }
    }

    /// Creates an unknown index alias error.
    pub fn unknown_index_alias(name: impl Into<String>) -> Self {
        Error::UnknownIndexAlias { name: name.into() }
    }

    /// Creates an ambiguous index error.
    pub fn ambiguous_index(message: impl Into<String>) -> Self {
        Error::AmbiguousIndex {
            message: message.into(),
        }
    }

    /// Creates an unknown query alias error.
    pub fn unknown_alias(alias: impl Into<String>) -> Self {
        Error::UnknownAlias {
            alias: alias.into(),
        }
    }

    /// Creates an unknown function error.
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Error::UnknownFunction { name: name.into() }
    }

    /// Creates a missing argument error.
    pub fn missing_argument(function: impl Into<String>, param: impl Into<String>) -> Self {
        Error::MissingArgument {
            function: function.into(),
            param: param.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Error::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Creates an arity mismatch error.
    pub fn arity_mismatch(table: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityMismatch {
            table: table.into(),
            expected,
            got,
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(op: impl Into<String>, left: &'static str, right: &'static str) -> Self {
        Error::TypeMismatch {
            op: op.into(),
            left,
            right,
        }
    }

    /// Creates a cyclic trigger error.
    pub fn cyclic_trigger(trigger: impl Into<String>) -> Self {
        Error::CyclicTrigger {
            trigger: trigger.into(),
        }
    }

    /// Creates a trigger depth error.
    pub fn trigger_depth_exceeded(trigger: impl Into<String>, depth: usize) -> Self {
        Error::TriggerDepthExceeded {
            trigger: trigger.into(),
            depth,
        }
    }

    /// Creates a missing projection error.
    pub fn missing_projection(query: impl Into<String>) -> Self {
        Error::MissingProjection {
            query: query.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for errors raised by the trigger cascade guard.
    pub fn is_cascade_error(&self) -> bool {
        matches!(
            self,
            Error::CyclicTrigger { .. } | Error::TriggerDepthExceeded { .. }
        )
    }
}
