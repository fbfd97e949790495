//! Query terms: literals and back-references to earlier steps.

use alloc::string::String;
use factview_core::Value;

/// Names an earlier select or function call of the same query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// The step at this position, counting from zero.
    Step(usize),
    /// The most recent step given this alias.
    Alias(String),
}

impl From<usize> for Source {
    fn from(step: usize) -> Self {
        Source::Step(step)
    }
}

impl From<&str> for Source {
    fn from(alias: &str) -> Self {
        Source::Alias(String::from(alias))
    }
}

impl From<String> for Source {
    fn from(alias: String) -> Self {
        Source::Alias(alias)
    }
}

/// A value bound in a join predicate, function argument, projection,
/// grouping or sort key.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// A literal value.
    Value(Value),
    /// A field of a selected fact, or the result of a function call when
    /// `field` is `None`.
    Ref {
        /// The referenced step.
        source: Source,
        /// The referenced field of a select.
        field: Option<String>,
    },
}

impl Term {
    /// A literal term.
    pub fn value(value: impl Into<Value>) -> Self {
        Term::Value(value.into())
    }

    /// A reference to a field of a selected fact.
    pub fn field(source: impl Into<Source>, field: &str) -> Self {
        Term::Ref {
            source: source.into(),
            field: Some(String::from(field)),
        }
    }

    /// A reference to the result of a function call.
    pub fn result(source: impl Into<Source>) -> Self {
        Term::Ref {
            source: source.into(),
            field: None,
        }
    }
}

/// Shorthand for [`Term::field`].
pub fn field(source: impl Into<Source>, field: &str) -> Term {
    Term::field(source, field)
}

/// Shorthand for [`Term::result`].
pub fn result(source: impl Into<Source>) -> Term {
    Term::result(source)
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Value(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::Value(value.into())
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::Value(value.into())
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Value(value.into())
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Value(value.into())
    }
}

/// String literals; use [`field`] or [`result`] for references.
impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::Value(value.into())
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Term::Value(value.into())
    }
}
