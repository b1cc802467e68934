//! [`NodeList`]: an ordered sequence of [`NodeId`]s together with a
//! `NodeId -> A` map. Both the cell parser's DAG and the evaluator's
//! per-cell state are instances of this one shape.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::diff::{MapEltUpdate, MapUpdate, NodeListUpdate, TailUpdate};
use crate::ids::NodeId;
use crate::monoid::Monoid;

/// Ordered id list paired with a value for each id.
///
/// Invariant: `ordered` has no duplicates, and `keys(map) == set(ordered)`.
/// Both are upheld by every method that mutates the list; there is no way
/// to construct an inconsistent `NodeList` through the public API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeList<A> {
    ordered: Vec<NodeId>,
    map: FxHashMap<NodeId, A>,
}

impl<A> Default for NodeList<A> {
    fn default() -> Self {
        NodeList {
            ordered: Vec::new(),
            map: FxHashMap::default(),
        }
    }
}

impl<A> NodeList<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids in list order.
    pub fn ordered_ids(&self) -> &[NodeId] {
        &self.ordered
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&A> {
        self.map.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut A> {
        self.map.get_mut(&id)
    }

    /// Values in list order.
    pub fn values(&self) -> impl Iterator<Item = &A> {
        self.ordered.iter().map(move |id| {
            self.map
                .get(id)
                .expect("NodeList invariant violated: ordered id missing from map")
        })
    }

    /// Values in list order, paired with their id.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &A)> {
        self.ordered.iter().map(move |id| {
            let v = self
                .map
                .get(id)
                .expect("NodeList invariant violated: ordered id missing from map");
            (*id, v)
        })
    }

    /// Check the structural invariant. Debug tool / test helper; a `NodeList`
    /// built only through `apply_update`/`push` cannot violate it.
    pub fn check_invariant(&self) -> bool {
        if self.ordered.len() != self.map.len() {
            return false;
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for id in &self.ordered {
            if !seen.insert(*id) {
                return false; // duplicate
            }
            if !self.map.contains_key(id) {
                return false;
            }
        }
        true
    }
}

impl<A: Clone> NodeList<A> {
    /// Apply a [`NodeListUpdate`] produced against this exact list.
    pub fn apply_update(&mut self, update: &NodeListUpdate<A>) {
        let TailUpdate {
            num_dropped,
            new_tail,
        } = &update.tail;
        let keep = self.ordered.len().saturating_sub(*num_dropped);
        self.ordered.truncate(keep);
        self.ordered.extend(new_tail.iter().copied());

        for (id, elt) in &update.map.0 {
            match elt {
                MapEltUpdate::Create(v) | MapEltUpdate::Update(v) => {
                    self.map.insert(*id, v.clone());
                }
                MapEltUpdate::Delete => {
                    self.map.remove(id);
                }
            }
        }

        debug_assert!(
            self.check_invariant(),
            "NodeList invariant violated after apply_update"
        );
    }

    /// The update that, applied to an empty list, produces this list's
    /// current contents verbatim. Used to replay a full snapshot as a diff
    /// for a consumer that only knows how to apply incremental updates.
    pub fn full_creation_diff(&self) -> NodeListUpdate<A> {
        let mut map = FxHashMap::default();
        for (id, v) in self.entries() {
            map.insert(id, MapEltUpdate::Create(v.clone()));
        }
        NodeListUpdate::new(
            TailUpdate::new(0, self.ordered.clone()),
            MapUpdate(map),
        )
    }
}

/// Length of the common prefix of two slices under `PartialEq`.
pub fn common_prefix_length<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FreshNames;

    fn list_from(values: &[&str], names: &FreshNames) -> NodeList<String> {
        let mut nl = NodeList::new();
        let ids = names.fresh_many(values.len());
        let update = NodeListUpdate::new(
            TailUpdate::new(0, ids.clone()),
            MapUpdate(
                ids.into_iter()
                    .zip(values.iter())
                    .map(|(id, v)| (id, MapEltUpdate::Create(v.to_string())))
                    .collect(),
            ),
        );
        nl.apply_update(&update);
        nl
    }

    #[test]
    fn apply_update_preserves_invariant() {
        let names = FreshNames::new();
        let nl = list_from(&["a", "b", "c"], &names);
        assert!(nl.check_invariant());
        assert_eq!(nl.values().cloned().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn common_prefix_length_works() {
        assert_eq!(common_prefix_length(&["a", "b", "c"], &["a", "b", "d"]), 2);
        assert_eq!(common_prefix_length::<&str>(&[], &["a"]), 0);
        assert_eq!(common_prefix_length(&["a", "b"], &["a", "b"]), 2);
    }

    #[test]
    fn round_trip_full_creation_diff() {
        let names = FreshNames::new();
        let nl = list_from(&["a", "b"], &names);
        let mut rebuilt = NodeList::new();
        rebuilt.apply_update(&nl.full_creation_diff());
        assert_eq!(
            rebuilt.ordered_ids().to_vec(),
            nl.ordered_ids().to_vec()
        );
        assert_eq!(
            rebuilt.values().cloned().collect::<Vec<_>>(),
            nl.values().cloned().collect::<Vec<_>>()
        );
    }
}
