//! The function registry queries call into.
//!
//! Each function declares ordered parameter names; a call binds arguments by
//! name and the compiler reorders them to match. What a function returns
//! decides how it behaves inside the nested loop:
//!
//! - scalar: binds one value
//! - multi: fans out, one downstream row per returned value
//! - filter: continues the row only when it returns true
//! - effect: runs for each row and binds nothing
//! - aggregate: runs once per group over the column of argument values

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use factview_core::{Result, Value};
use hashbrown::HashMap;

type ScalarFn = dyn Fn(&[Value]) -> Result<Value>;
type MultiFn = dyn Fn(&[Value]) -> Result<Vec<Value>>;
type FilterFn = dyn Fn(&[Value]) -> Result<bool>;
type EffectFn = dyn Fn(&[Value]) -> Result<()>;
type AggregateFn = dyn Fn(&[Vec<Value>]) -> Result<Value>;

/// How a function participates in query execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Returns one value.
    Scalar,
    /// Returns any number of values.
    Multi,
    /// Returns whether the row continues.
    Filter,
    /// Returns nothing.
    Effect,
    /// Reduces one column per parameter to a value.
    Aggregate,
}

/// A function implementation.
#[derive(Clone)]
pub enum FunctionBody {
    /// See [`FunctionKind::Scalar`].
    Scalar(Rc<ScalarFn>),
    /// See [`FunctionKind::Multi`].
    Multi(Rc<MultiFn>),
    /// See [`FunctionKind::Filter`].
    Filter(Rc<FilterFn>),
    /// See [`FunctionKind::Effect`].
    Effect(Rc<EffectFn>),
    /// See [`FunctionKind::Aggregate`].
    Aggregate(Rc<AggregateFn>),
}

impl FunctionBody {
    /// Returns the kind of this body.
    pub fn kind(&self) -> FunctionKind {
        match self {
            FunctionBody::Scalar(_) => FunctionKind::Scalar,
            FunctionBody::Multi(_) => FunctionKind::Multi,
            FunctionBody::Filter(_) => FunctionKind::Filter,
            FunctionBody::Effect(_) => FunctionKind::Effect,
            FunctionBody::Aggregate(_) => FunctionKind::Aggregate,
        }
    }
}

/// A registered function.
#[derive(Clone)]
pub struct FunctionDef {
    name: String,
    params: Vec<String>,
    body: FunctionBody,
}

impl FunctionDef {
    /// Creates a definition.
    pub fn new(name: impl Into<String>, params: &[&str], body: FunctionBody) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
        }
    }

    /// Returns the function name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameter names in call order.
    #[inline]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the function kind.
    #[inline]
    pub fn kind(&self) -> FunctionKind {
        self.body.kind()
    }

    /// Returns the implementation.
    #[inline]
    pub fn body(&self) -> &FunctionBody {
        &self.body
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("kind", &self.kind())
            .finish()
    }
}

impl PartialEq for FunctionDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params && self.kind() == other.kind()
    }
}

/// Functions available to queries, by name.
///
/// Populate it before compiling queries that reference it. A compiled plan
/// keeps the definitions it resolved, so redefining a function affects only
/// queries compiled afterwards.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Rc<FunctionDef>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the builtin functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::install(&mut registry);
        registry
    }

    /// Registers a definition, replacing any function of the same name.
    pub fn register(&mut self, def: FunctionDef) -> &mut Self {
        self.functions.insert(def.name.clone(), Rc::new(def));
        self
    }

    /// Registers a scalar function.
    pub fn define(
        &mut self,
        name: &str,
        params: &[&str],
        func: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> &mut Self {
        self.register(FunctionDef::new(name, params, FunctionBody::Scalar(Rc::new(func))))
    }

    /// Registers a function returning any number of values.
    pub fn define_multi(
        &mut self,
        name: &str,
        params: &[&str],
        func: impl Fn(&[Value]) -> Result<Vec<Value>> + 'static,
    ) -> &mut Self {
        self.register(FunctionDef::new(name, params, FunctionBody::Multi(Rc::new(func))))
    }

    /// Registers a filter.
    pub fn define_filter(
        &mut self,
        name: &str,
        params: &[&str],
        func: impl Fn(&[Value]) -> Result<bool> + 'static,
    ) -> &mut Self {
        self.register(FunctionDef::new(name, params, FunctionBody::Filter(Rc::new(func))))
    }

    /// Registers a function called for its side effects.
    pub fn define_effect(
        &mut self,
        name: &str,
        params: &[&str],
        func: impl Fn(&[Value]) -> Result<()> + 'static,
    ) -> &mut Self {
        self.register(FunctionDef::new(name, params, FunctionBody::Effect(Rc::new(func))))
    }

    /// Registers an aggregate. It receives one column per parameter.
    pub fn define_aggregate(
        &mut self,
        name: &str,
        params: &[&str],
        func: impl Fn(&[Vec<Value>]) -> Result<Value> + 'static,
    ) -> &mut Self {
        self.register(FunctionDef::new(name, params, FunctionBody::Aggregate(Rc::new(func))))
    }

    /// Looks up a function.
    pub fn get(&self, name: &str) -> Option<Rc<FunctionDef>> {
        self.functions.get(name).cloned()
    }

    /// Returns true if a function is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Unregisters a function. Returns true if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if no function is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
