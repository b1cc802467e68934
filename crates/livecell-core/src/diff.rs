//! Incremental update types: [`Overwrite`], [`TailUpdate`], [`MapEltUpdate`],
//! [`MapUpdate`] and the composite [`NodeListUpdate`] used by the cell parser
//! and the DAG evaluator to describe changes to their respective
//! [`crate::list::NodeList`]s.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ids::NodeId;
use crate::monoid::Monoid;

/// The file watcher's incremental type: either nothing changed, or the file
/// now reads as the given contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "snake_case")]
pub enum Overwrite<T> {
    NoChange,
    OverwriteWith(T),
}

impl<T: Clone> Monoid for Overwrite<T> {
    fn mempty() -> Self {
        Overwrite::NoChange
    }

    fn combine(&self, other: &Self) -> Self {
        match other {
            Overwrite::OverwriteWith(t) => Overwrite::OverwriteWith(t.clone()),
            Overwrite::NoChange => self.clone(),
        }
    }
}

/// Drop the last `num_dropped` elements of a list, then append `new_tail`.
///
/// Composing two `TailUpdate`s normalizes the later drop against the
/// elements the earlier update appended: a later drop may consume part (or
/// all, and then some) of an earlier append rather than reaching back into
/// the original list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailUpdate<A> {
    pub num_dropped: usize,
    pub new_tail: Vec<A>,
}

impl<A> TailUpdate<A> {
    pub fn new(num_dropped: usize, new_tail: Vec<A>) -> Self {
        Self {
            num_dropped,
            new_tail,
        }
    }
}

impl<A: Clone> Monoid for TailUpdate<A> {
    fn mempty() -> Self {
        TailUpdate {
            num_dropped: 0,
            new_tail: Vec::new(),
        }
    }

    fn combine(&self, other: &Self) -> Self {
        if other.num_dropped <= self.new_tail.len() {
            // The second drop is fully absorbed by the first append.
            let keep = self.new_tail.len() - other.num_dropped;
            let mut new_tail = self.new_tail[..keep].to_vec();
            new_tail.extend(other.new_tail.iter().cloned());
            TailUpdate {
                num_dropped: self.num_dropped,
                new_tail,
            }
        } else {
            // The second drop consumes all of the first append and reaches
            // further back into the list the first update dropped from.
            let extra = other.num_dropped - self.new_tail.len();
            TailUpdate {
                num_dropped: self.num_dropped + extra,
                new_tail: other.new_tail.clone(),
            }
        }
    }
}

/// A single key's change in a [`MapUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "value", rename_all = "snake_case")]
pub enum MapEltUpdate<A> {
    Create(A),
    Update(A),
    Delete,
}

impl<A: Clone> MapEltUpdate<A> {
    /// Compose `self` (earlier) with `other` (later). `None` means the two
    /// updates cancel out entirely (e.g. created then deleted within the
    /// same batch).
    fn combine(&self, other: &Self) -> Option<Self> {
        use MapEltUpdate::*;
        Some(match (self, other) {
            (Create(_), Update(b)) => Create(b.clone()),
            (Create(_), Delete) => return None,
            (Update(_), Update(b)) => Update(b.clone()),
            (Update(_), Delete) => Delete,
            (Delete, Create(b)) => Update(b.clone()),
            // Not reachable under correct usage (e.g. Create·Create,
            // Delete·Update) since a NodeId is never reused without an
            // intervening flush. Stay total rather than panic on it.
            (_, later) => later.clone(),
        })
    }
}

/// A batch of per-key create/update/delete changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapUpdate<K: Eq + Hash, A>(pub FxHashMap<K, MapEltUpdate<A>>);

impl<K: Eq + Hash, A> Default for MapUpdate<K, A> {
    fn default() -> Self {
        MapUpdate(FxHashMap::default())
    }
}

impl<K: Eq + Hash + Clone, A: Clone> Monoid for MapUpdate<K, A> {
    fn mempty() -> Self {
        MapUpdate::default()
    }

    fn combine(&self, other: &Self) -> Self {
        let mut out = self.0.clone();
        for (k, b) in &other.0 {
            match out.remove(k) {
                Some(a) => {
                    if let Some(c) = a.combine(b) {
                        out.insert(k.clone(), c);
                    }
                }
                None => {
                    out.insert(k.clone(), b.clone());
                }
            }
        }
        MapUpdate(out)
    }
}

/// The diff emitted by the cell parser and by the DAG evaluator: a tail
/// update to the ordered id list, paired with a map update describing what
/// each affected id now holds.
///
/// Invariant: every id appearing in `tail.new_tail` has a matching `Create`
/// in `map`; every id the tail update drops has a matching `Delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeListUpdate<A> {
    pub tail: TailUpdate<NodeId>,
    pub map: MapUpdate<NodeId, A>,
}

impl<A> NodeListUpdate<A> {
    pub fn new(tail: TailUpdate<NodeId>, map: MapUpdate<NodeId, A>) -> Self {
        Self { tail, map }
    }
}

impl<A: Clone> Monoid for NodeListUpdate<A> {
    fn mempty() -> Self {
        NodeListUpdate {
            tail: TailUpdate::mempty(),
            map: MapUpdate::mempty(),
        }
    }

    fn combine(&self, other: &Self) -> Self {
        NodeListUpdate {
            tail: self.tail.combine(&other.tail),
            map: self.map.combine(&other.map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_update_identity() {
        let u = TailUpdate::new(2, vec!["a", "b", "c"]);
        let id = TailUpdate::mempty();
        assert_eq!(u.combine(&id), u);
        assert_eq!(id.combine(&u), u);
    }

    #[test]
    fn tail_update_later_drop_absorbed_by_append() {
        // drop 1, append [4,5]; then drop 1 (consumes the "5")
        let u1 = TailUpdate::new(1, vec![4, 5]);
        let u2 = TailUpdate::new(1, vec![]);
        let combined = u1.combine(&u2);
        assert_eq!(combined, TailUpdate::new(1, vec![4]));
    }

    #[test]
    fn tail_update_later_drop_reaches_past_append() {
        // drop 1, append [4]; then drop 2 (consumes "4" and one more from base)
        let u1 = TailUpdate::new(1, vec![4]);
        let u2 = TailUpdate::new(2, vec![9]);
        let combined = u1.combine(&u2);
        assert_eq!(combined, TailUpdate::new(2, vec![9]));
    }

    #[test]
    fn tail_update_associative() {
        let u1 = TailUpdate::new(1, vec![10, 11, 12]);
        let u2 = TailUpdate::new(2, vec![13]);
        let u3 = TailUpdate::new(1, vec![14, 15]);
        let left = u1.combine(&u2).combine(&u3);
        let right = u1.combine(&u2.combine(&u3));
        assert_eq!(left, right);
    }

    #[test]
    fn map_elt_create_then_delete_cancels() {
        let a = MapEltUpdate::Create(1);
        let b: MapEltUpdate<i32> = MapEltUpdate::Delete;
        assert_eq!(a.combine(&b), None);
    }

    #[test]
    fn map_elt_delete_then_create_is_update() {
        let a: MapEltUpdate<i32> = MapEltUpdate::Delete;
        let b = MapEltUpdate::Create(7);
        assert_eq!(a.combine(&b), Some(MapEltUpdate::Update(7)));
    }

    #[test]
    fn map_update_monoid_identity() {
        let mut m = FxHashMap::default();
        m.insert(NodeId::from_raw(0), MapEltUpdate::Create("a"));
        let u = MapUpdate(m);
        assert_eq!(u.combine(&MapUpdate::mempty()), u);
        assert_eq!(MapUpdate::mempty().combine(&u), u);
    }

    #[test]
    fn overwrite_latest_wins() {
        let a = Overwrite::OverwriteWith("first".to_string());
        let b = Overwrite::OverwriteWith("second".to_string());
        assert_eq!(a.combine(&b), b.clone());
        assert_eq!(b.combine(&Overwrite::NoChange), b);
    }
}
