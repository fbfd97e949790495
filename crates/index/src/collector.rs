//! Collector index: key tuple → bucket of facts.
//!
//! Buckets are nested one map level per key, so a key prefix addresses a
//! group of sub-groups. Emptied buckets and branches are removed.

use crate::traits::IndexMaintainer;
use crate::tree::{KeyNode, KeyTree};
use alloc::vec::Vec;
use factview_core::{Fact, Value};

/// Groups facts hierarchically by the values at its key positions.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectorIndex {
    keys: Vec<usize>,
    tree: KeyTree<Vec<Fact>>,
    len: usize,
}

impl CollectorIndex {
    /// Creates an empty collector.
    pub fn new(keys: Vec<usize>) -> Self {
        Self {
            keys,
            tree: KeyTree::new(),
            len: 0,
        }
    }

    /// Returns the key positions.
    pub fn keys(&self) -> &[usize] {
        &self.keys
    }

    /// Returns the facts under a full key tuple; empty when the key is absent.
    pub fn get(&self, key: &[Value]) -> &[Fact] {
        self.tree.leaf(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the group addressed by a key prefix.
    pub fn group(&self, prefix: &[Value]) -> Option<&KeyNode<Vec<Fact>>> {
        self.tree.node(prefix)
    }

    /// Returns true if any fact is stored under the key prefix.
    pub fn contains_key(&self, prefix: &[Value]) -> bool {
        self.tree.node(prefix).is_some()
    }

    /// Iterates over the outermost key values.
    pub fn outer_keys(&self) -> impl Iterator<Item = &Value> {
        self.tree.root().keys()
    }

    /// Returns the underlying key tree.
    pub fn tree(&self) -> &KeyTree<Vec<Fact>> {
        &self.tree
    }
}

impl IndexMaintainer for CollectorIndex {
    fn apply(&mut self, adds: &[Fact], removes: &[Fact]) {
        for remove in removes {
            let path = remove.project(&self.keys);
            let mut removed = false;
            self.tree.remove_where(&path, |bucket| {
                if let Some(pos) = bucket.iter().position(|f| f == remove) {
                    bucket.remove(pos);
                    removed = true;
                }
                bucket.is_empty()
            });
            if removed {
                self.len -= 1;
            }
        }
        for add in adds {
            let path = add.project(&self.keys);
            if let Some(bucket) = self.tree.leaf_mut_or_insert(&path, Vec::new) {
                bucket.push(add.clone());
                self.len += 1;
            }
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
