//! Index descriptors.
//!
//! An `IndexSpec` names an index kind and the fact positions it is keyed on.
//! Its tag (`"<kind><k1,k2,...>"`) is the cache key a table uses so that
//! requesting the same kind and keys twice returns the same live index.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use factview_core::{Error, Result};

/// The value a lookup index stores under each key tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupValue {
    /// The value at this fact position.
    Field(usize),
    /// The whole fact.
    Fact,
}

/// The kind of an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKind {
    /// Key tuple → single value.
    Lookup(LookupValue),
    /// Key tuple → bucket of facts.
    Collector,
    /// Facts totally ordered by the keys.
    Sorter,
}

impl IndexKind {
    /// Returns the kind name used in type tags.
    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::Lookup(_) => "lookup",
            IndexKind::Collector => "collector",
            IndexKind::Sorter => "sorter",
        }
    }
}

/// Describes one index over a table: its kind and key positions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexSpec {
    kind: IndexKind,
    keys: Vec<usize>,
}

impl IndexSpec {
    /// Creates a lookup spec from key positions to the given value.
    pub fn lookup(keys: Vec<usize>, value: LookupValue) -> Self {
        Self {
            kind: IndexKind::Lookup(value),
            keys,
        }
    }

    /// Creates a collector spec grouping by the given positions, outermost first.
    pub fn collector(keys: Vec<usize>) -> Self {
        Self {
            kind: IndexKind::Collector,
            keys,
        }
    }

    /// Creates a sorter spec ordering by the given positions, primary key first.
    pub fn sorter(keys: Vec<usize>) -> Self {
        Self {
            kind: IndexKind::Sorter,
            keys,
        }
    }

    /// Builds a spec from a kind name and a key list.
    ///
    /// For `lookup`, the last entry of `keys` is the value position and the
    /// rest are the key positions; use [`IndexSpec::lookup`] for whole-fact
    /// lookups.
    pub fn parse(kind: &str, keys: &[usize]) -> Result<Self> {
        let spec = match kind {
            "lookup" => match keys.split_last() {
                Some((&value, keys)) => Self::lookup(keys.to_vec(), LookupValue::Field(value)),
                None => {
                    return Err(Error::ambiguous_index(
                        "lookup requires at least a key and a value position",
                    ))
                }
            },
            "collector" => Self::collector(keys.to_vec()),
            "sorter" => Self::sorter(keys.to_vec()),
            other => return Err(Error::unknown_index_kind(other)),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks that the spec can key an index.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            IndexKind::Lookup(_) | IndexKind::Collector if self.keys.is_empty() => Err(
                Error::ambiguous_index(format!("{} requires at least one key", self.kind.name())),
            ),
            _ => Ok(()),
        }
    }

    /// Returns the index kind.
    #[inline]
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Returns the key positions.
    #[inline]
    pub fn keys(&self) -> &[usize] {
        &self.keys
    }

    /// Returns the type tag, e.g. `"collector<0,1>"` or `"lookup<0,*>"`.
    pub fn tag(&self) -> String {
        format!("{}", self)
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<", self.kind.name())?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", key)?;
        }
        match self.kind {
            IndexKind::Lookup(LookupValue::Field(value)) => write!(f, ",{}>", value),
            IndexKind::Lookup(LookupValue::Fact) => f.write_str(",*>"),
            _ => f.write_str(">"),
        }
    }
}

impl FromStr for IndexSpec {
    type Err = Error;

    /// Parses a type tag back into a spec.
    fn from_str(tag: &str) -> Result<Self> {
        let malformed = || Error::ambiguous_index(format!("malformed index tag '{}'", tag));
        let open = tag.find('<').ok_or_else(malformed)?;
        let inner = tag[open + 1..].strip_suffix('>').ok_or_else(malformed)?;
        let kind = &tag[..open];

        let mut parts: Vec<&str> = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };

        let whole_fact = kind == "lookup" && parts.last() == Some(&"*");
        if whole_fact {
            parts.pop();
        }
        let keys = parts
            .iter()
            .map(|p| p.parse::<usize>().map_err(|_| malformed()))
            .collect::<Result<Vec<usize>>>()?;

        if whole_fact {
            let spec = Self::lookup(keys, LookupValue::Fact);
            spec.validate()?;
            Ok(spec)
        } else {
            Self::parse(kind, &keys)
        }
    }
}
