//! The maintenance interface shared by every index kind.

use crate::collector::CollectorIndex;
use crate::lookup::LookupIndex;
use crate::sorter::SorterIndex;
use crate::spec::{IndexKind, IndexSpec};
use factview_core::Fact;

/// An index kept current from the real changes of a diff.
///
/// Removals are applied before adds, so a fact removed and re-added in one
/// call ends up present.
pub trait IndexMaintainer {
    /// Applies one batch of changes. Every fact in `removes` is currently
    /// stored and no fact in `adds` is.
    fn apply(&mut self, adds: &[Fact], removes: &[Fact]);

    /// Removes every entry.
    fn clear(&mut self);

    /// Returns the number of entries (keys for lookups, facts otherwise).
    fn len(&self) -> usize;

    /// Returns true if the index holds nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Any index a table can carry, together with the spec it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct FactIndex {
    spec: IndexSpec,
    inner: IndexImpl,
}

#[derive(Clone, Debug, PartialEq)]
enum IndexImpl {
    Lookup(LookupIndex),
    Collector(CollectorIndex),
    Sorter(SorterIndex),
}

impl FactIndex {
    /// Creates an empty index for the spec.
    pub fn new(spec: IndexSpec) -> Self {
        let inner = match spec.kind() {
            IndexKind::Lookup(value) => IndexImpl::Lookup(LookupIndex::new(spec.keys().to_vec(), value)),
            IndexKind::Collector => IndexImpl::Collector(CollectorIndex::new(spec.keys().to_vec())),
            IndexKind::Sorter => IndexImpl::Sorter(SorterIndex::new(spec.keys())),
        };
        Self { spec, inner }
    }

    /// Creates an index for the spec populated with `facts`.
    pub fn build<'a>(spec: IndexSpec, facts: impl IntoIterator<Item = &'a Fact>) -> Self {
        let mut index = Self::new(spec);
        let facts: alloc::vec::Vec<Fact> = facts.into_iter().cloned().collect();
        index.apply(&facts, &[]);
        index
    }

    /// Returns the spec.
    #[inline]
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Applies one batch of real changes.
    pub fn apply(&mut self, adds: &[Fact], removes: &[Fact]) {
        self.maintainer_mut().apply(adds, removes);
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.maintainer_mut().clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.maintainer().len()
    }

    /// Returns true if the index holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the lookup index, if this is one.
    pub fn as_lookup(&self) -> Option<&LookupIndex> {
        match &self.inner {
            IndexImpl::Lookup(index) => Some(index),
            _ => None,
        }
    }

    /// Returns the collector index, if this is one.
    pub fn as_collector(&self) -> Option<&CollectorIndex> {
        match &self.inner {
            IndexImpl::Collector(index) => Some(index),
            _ => None,
        }
    }

    /// Returns the sorter index, if this is one.
    pub fn as_sorter(&self) -> Option<&SorterIndex> {
        match &self.inner {
            IndexImpl::Sorter(index) => Some(index),
            _ => None,
        }
    }

    fn maintainer(&self) -> &dyn IndexMaintainer {
        match &self.inner {
            IndexImpl::Lookup(index) => index,
            IndexImpl::Collector(index) => index,
            IndexImpl::Sorter(index) => index,
        }
    }

    fn maintainer_mut(&mut self) -> &mut dyn IndexMaintainer {
        match &mut self.inner {
            IndexImpl::Lookup(index) => index,
            IndexImpl::Collector(index) => index,
            IndexImpl::Sorter(index) => index,
        }
    }
}

impl IndexMaintainer for FactIndex {
    fn apply(&mut self, adds: &[Fact], removes: &[Fact]) {
        FactIndex::apply(self, adds, removes);
    }

    fn clear(&mut self) {
        FactIndex::clear(self);
    }

    fn len(&self) -> usize {
        FactIndex::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::LookupValue;
    use alloc::vec;
    use factview_core::Value;

    fn fact(a: i64, b: i64) -> Fact {
        Fact::new(vec![Value::Int64(a), Value::Int64(b)])
    }

    #[test]
    fn test_new_matches_kind() {
        assert!(FactIndex::new(IndexSpec::collector(vec![0])).as_collector().is_some());
        assert!(FactIndex::new(IndexSpec::sorter(vec![0])).as_sorter().is_some());
        let lookup = FactIndex::new(IndexSpec::lookup(vec![0], LookupValue::Field(1)));
        assert!(lookup.as_lookup().is_some());
        assert!(lookup.as_collector().is_none());
    }

    #[test]
    fn test_build_from_existing_facts() {
        let facts = vec![fact(1, 10), fact(2, 20)];
        let index = FactIndex::build(IndexSpec::lookup(vec![0], LookupValue::Field(1)), &facts);
        let lookup = index.as_lookup().unwrap();
        assert_eq!(lookup.get_value(&[Value::Int64(2)]), Some(&Value::Int64(20)));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut index = FactIndex::build(IndexSpec::sorter(vec![1]), &[fact(1, 1)]);
        assert!(!index.is_empty());
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.spec(), &IndexSpec::sorter(vec![1]));
    }
}
