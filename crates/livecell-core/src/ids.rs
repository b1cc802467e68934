//! Stable node identities.
//!
//! Cells (and, after evaluation, their results) are identified by a
//! [`NodeId`] that is allocated once and never reused. Identity survives a
//! re-parse as long as the underlying cell text is unchanged, which is the
//! mechanism by which evaluation results survive edits to later cells.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, monotonically-allocated cell identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Construct a `NodeId` directly. Only meant for tests and for
    /// deserializing ids that were allocated elsewhere.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer backing this id.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Monotonic counter handing out fresh, never-repeated [`NodeId`]s.
#[derive(Debug, Default)]
pub struct FreshNames {
    next: AtomicU64,
}

impl FreshNames {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Allocate the next id.
    pub fn fresh(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate `count` fresh ids in order.
    pub fn fresh_many(&self, count: usize) -> Vec<NodeId> {
        (0..count).map(|_| self.fresh()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_distinct() {
        let names = FreshNames::new();
        let a = names.fresh();
        let b = names.fresh();
        let c = names.fresh();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(a.as_raw() < b.as_raw());
        assert!(b.as_raw() < c.as_raw());
    }

    #[test]
    fn fresh_many_allocates_in_order() {
        let names = FreshNames::new();
        let ids = names.fresh_many(3);
        assert_eq!(ids.len(), 3);
        assert!(ids[0].as_raw() < ids[1].as_raw());
        assert!(ids[1].as_raw() < ids[2].as_raw());
    }
}
