//! Nested key maps shared by lookup and collector indexes.
//!
//! A `KeyTree` has one map level per key position. Interior levels are
//! branches; the last level holds leaves. Removing the last entry under a
//! path prunes every branch that becomes empty, so an absent key is
//! genuinely absent rather than mapped to an empty container.

use factview_core::Value;
use hashbrown::HashMap;

/// One level of a key tree.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyNode<L> {
    /// Final level: the stored leaf.
    Leaf(L),
    /// Interior level: next key value → subtree.
    Branch(HashMap<Value, KeyNode<L>>),
}

impl<L> KeyNode<L> {
    /// Returns the leaf if this node is one.
    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            KeyNode::Leaf(leaf) => Some(leaf),
            KeyNode::Branch(_) => None,
        }
    }

    /// Returns the children if this node is a branch.
    pub fn as_branch(&self) -> Option<&HashMap<Value, KeyNode<L>>> {
        match self {
            KeyNode::Leaf(_) => None,
            KeyNode::Branch(children) => Some(children),
        }
    }

    /// Visits every leaf below this node.
    pub fn for_each_leaf<'a>(&'a self, f: &mut dyn FnMut(&'a L)) {
        match self {
            KeyNode::Leaf(leaf) => f(leaf),
            KeyNode::Branch(children) => {
                for child in children.values() {
                    child.for_each_leaf(f);
                }
            }
        }
    }
}

/// A map from key tuples to leaves, nested one level per key.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyTree<L> {
    root: HashMap<Value, KeyNode<L>>,
}

impl<L> Default for KeyTree<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> KeyTree<L> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: HashMap::new(),
        }
    }

    /// Returns the top-level map.
    #[inline]
    pub fn root(&self) -> &HashMap<Value, KeyNode<L>> {
        &self.root
    }

    /// Returns true if the tree holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.root.clear();
    }

    /// Returns the node at the end of `path`, which may be a prefix of a full key.
    pub fn node(&self, path: &[Value]) -> Option<&KeyNode<L>> {
        let (head, rest) = path.split_first()?;
        let mut node = self.root.get(head)?;
        for key in rest {
            node = node.as_branch()?.get(key)?;
        }
        Some(node)
    }

    /// Returns the leaf stored under a full key.
    pub fn leaf(&self, path: &[Value]) -> Option<&L> {
        self.node(path)?.as_leaf()
    }

    /// Returns the leaf under `path`, creating it (and its branches) if absent.
    ///
    /// Returns `None` only when `path` is empty or its length disagrees with
    /// the depth already established in the tree.
    pub fn leaf_mut_or_insert(&mut self, path: &[Value], make: impl FnOnce() -> L) -> Option<&mut L> {
        leaf_mut_or_insert(&mut self.root, path, make)
    }

    /// Overwrites the leaf under `path`.
    pub fn set(&mut self, path: &[Value], leaf: L) {
        set_in(&mut self.root, path, leaf);
    }

    /// Lets `f` edit the leaf under `path`; when `f` returns true the leaf is
    /// deleted and any branch left empty is pruned.
    pub fn remove_where(&mut self, path: &[Value], f: impl FnOnce(&mut L) -> bool) {
        remove_where(&mut self.root, path, f);
    }

    /// Deletes the leaf under `path`, pruning empty branches.
    pub fn remove(&mut self, path: &[Value]) {
        self.remove_where(path, |_| true);
    }
}

fn set_in<L>(map: &mut HashMap<Value, KeyNode<L>>, path: &[Value], leaf: L) {
    match path {
        [] => {}
        [last] => {
            map.insert(last.clone(), KeyNode::Leaf(leaf));
        }
        [head, rest @ ..] => {
            if let KeyNode::Branch(children) = map
                .entry(head.clone())
                .or_insert_with(|| KeyNode::Branch(HashMap::new()))
            {
                set_in(children, rest, leaf);
            }
        }
    }
}

fn leaf_mut_or_insert<'a, L>(
    map: &'a mut HashMap<Value, KeyNode<L>>,
    path: &[Value],
    make: impl FnOnce() -> L,
) -> Option<&'a mut L> {
    match path {
        [] => None,
        [last] => match map.entry(last.clone()).or_insert_with(|| KeyNode::Leaf(make())) {
            KeyNode::Leaf(leaf) => Some(leaf),
            KeyNode::Branch(_) => None,
        },
        [head, rest @ ..] => {
            match map
                .entry(head.clone())
                .or_insert_with(|| KeyNode::Branch(HashMap::new()))
            {
                KeyNode::Branch(children) => leaf_mut_or_insert(children, rest, make),
                KeyNode::Leaf(_) => None,
            }
        }
    }
}

fn remove_where<L>(
    map: &mut HashMap<Value, KeyNode<L>>,
    path: &[Value],
    f: impl FnOnce(&mut L) -> bool,
) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    let prune = match map.get_mut(head) {
        None => false,
        Some(KeyNode::Leaf(leaf)) => rest.is_empty() && f(leaf),
        Some(KeyNode::Branch(children)) => {
            if rest.is_empty() {
                false
            } else {
                remove_where(children, rest, f);
                children.is_empty()
            }
        }
    };
    if prune {
        map.remove(head);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn key(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Int64(v)).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let mut tree: KeyTree<Vec<i64>> = KeyTree::new();
        tree.leaf_mut_or_insert(&key(&[1, 2]), Vec::new).unwrap().push(10);
        tree.leaf_mut_or_insert(&key(&[1, 2]), Vec::new).unwrap().push(11);
        tree.leaf_mut_or_insert(&key(&[1, 3]), Vec::new).unwrap().push(12);

        assert_eq!(tree.leaf(&key(&[1, 2])), Some(&vec![10, 11]));
        assert_eq!(tree.leaf(&key(&[1, 3])), Some(&vec![12]));
        assert_eq!(tree.leaf(&key(&[2, 3])), None);

        let group = tree.node(&key(&[1])).unwrap();
        assert_eq!(group.as_branch().unwrap().len(), 2);
    }

    #[test]
    fn test_set_overwrites() {
        let mut tree: KeyTree<i64> = KeyTree::new();
        tree.set(&key(&[1]), 5);
        tree.set(&key(&[1]), 6);
        assert_eq!(tree.leaf(&key(&[1])), Some(&6));
    }

    #[test]
    fn test_remove_prunes_empty_branches() {
        let mut tree: KeyTree<i64> = KeyTree::new();
        tree.set(&key(&[1, 2, 3]), 5);
        tree.set(&key(&[1, 4, 3]), 6);

        tree.remove(&key(&[1, 2, 3]));
        assert!(tree.node(&key(&[1, 2])).is_none());
        assert!(tree.node(&key(&[1])).is_some());

        tree.remove(&key(&[1, 4, 3]));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_where_keeps_nonempty_leaf() {
        let mut tree: KeyTree<Vec<i64>> = KeyTree::new();
        tree.set(&key(&[7]), vec![1, 2]);
        tree.remove_where(&key(&[7]), |bucket| {
            bucket.retain(|&v| v != 1);
            bucket.is_empty()
        });
        assert_eq!(tree.leaf(&key(&[7])), Some(&vec![2]));
    }

    #[test]
    fn test_depth_mismatch_is_rejected() {
        let mut tree: KeyTree<i64> = KeyTree::new();
        tree.set(&key(&[1, 2]), 1);
        assert!(tree.leaf_mut_or_insert(&key(&[1]), || 0).is_none());
        assert!(tree.leaf_mut_or_insert(&[], || 0).is_none());
        // A too-long path never removes anything.
        tree.remove(&key(&[1, 2, 3]));
        assert_eq!(tree.leaf(&key(&[1, 2])), Some(&1));
    }

    #[test]
    fn test_for_each_leaf() {
        let mut tree: KeyTree<i64> = KeyTree::new();
        tree.set(&key(&[1, 1]), 1);
        tree.set(&key(&[1, 2]), 2);
        tree.set(&key(&[2, 1]), 3);
        let mut sum = 0;
        for node in tree.root().values() {
            node.for_each_leaf(&mut |v| sum += *v);
        }
        assert_eq!(sum, 6);
    }
}
