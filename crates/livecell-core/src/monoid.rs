//! The `Monoid` capability shared by every incremental update type.
//!
//! Every update type pushed through an [`crate::incremental::IncrementalServer`]
//! must compose associatively and have an identity, so that batching several
//! `update()` calls before a `flush_diffs()` is indistinguishable from
//! applying them one at a time.

/// A monoid: an associative binary operation with an identity element.
///
/// Implementors must satisfy, for all `a`, `b`, `c`:
/// - `a.combine(&Self::mempty()) == a`
/// - `Self::mempty().combine(&a) == a`
/// - `a.combine(&b).combine(&c) == a.combine(&b.combine(&c))`
pub trait Monoid: Sized {
    /// The identity element.
    fn mempty() -> Self;

    /// Associative composition. `self` happened first, `other` happened
    /// after; the result describes the combined effect.
    fn combine(&self, other: &Self) -> Self;
}
