//! Lookup index: key tuple → single value.
//!
//! Removals delete the key; adds overwrite it, so the last add in a diff
//! wins when several facts share a key tuple.

use crate::spec::LookupValue;
use crate::traits::IndexMaintainer;
use crate::tree::KeyTree;
use alloc::vec::Vec;
use factview_core::{Fact, Value};

/// The value stored under one lookup key.
#[derive(Clone, Debug, PartialEq)]
pub enum LookupEntry {
    /// A single field of the most recently added fact.
    Value(Value),
    /// The most recently added fact itself.
    Fact(Fact),
}

impl LookupEntry {
    /// Returns the stored field value, if this entry holds one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            LookupEntry::Value(v) => Some(v),
            LookupEntry::Fact(_) => None,
        }
    }

    /// Returns the stored fact, if this entry holds one.
    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            LookupEntry::Value(_) => None,
            LookupEntry::Fact(f) => Some(f),
        }
    }
}

/// A single-valued map from key tuples to a field or a whole fact.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupIndex {
    keys: Vec<usize>,
    value: LookupValue,
    tree: KeyTree<LookupEntry>,
    len: usize,
}

impl LookupIndex {
    /// Creates an empty lookup index.
    pub fn new(keys: Vec<usize>, value: LookupValue) -> Self {
        Self {
            keys,
            value,
            tree: KeyTree::new(),
            len: 0,
        }
    }

    /// Returns the entry stored under a full key tuple.
    pub fn get(&self, key: &[Value]) -> Option<&LookupEntry> {
        self.tree.leaf(key)
    }

    /// Returns the stored value under a full key tuple (field lookups only).
    pub fn get_value(&self, key: &[Value]) -> Option<&Value> {
        self.get(key)?.as_value()
    }

    /// Returns the stored fact under a full key tuple (whole-fact lookups only).
    pub fn get_fact(&self, key: &[Value]) -> Option<&Fact> {
        self.get(key)?.as_fact()
    }

    /// Returns true if the full key tuple is present.
    pub fn contains_key(&self, key: &[Value]) -> bool {
        self.get(key).is_some()
    }

    /// Returns the underlying key tree.
    pub fn tree(&self) -> &KeyTree<LookupEntry> {
        &self.tree
    }

    fn entry_for(&self, fact: &Fact) -> LookupEntry {
        match self.value {
            LookupValue::Field(position) => LookupEntry::Value(fact.get_or_null(position)),
            LookupValue::Fact => LookupEntry::Fact(fact.clone()),
        }
    }
}

impl IndexMaintainer for LookupIndex {
    fn apply(&mut self, adds: &[Fact], removes: &[Fact]) {
        for remove in removes {
            let path = remove.project(&self.keys);
            if self.tree.leaf(&path).is_some() {
                self.tree.remove(&path);
                self.len -= 1;
            }
        }
        for add in adds {
            let path = add.project(&self.keys);
            if self.tree.leaf(&path).is_none() {
                self.len += 1;
            }
            let entry = self.entry_for(add);
            self.tree.set(&path, entry);
        }
    }

    fn clear(&mut self) {
        self.tree.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }
}
