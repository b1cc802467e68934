//! Generic incremental state: a value `S` plus a pending, not-yet-broadcast
//! update `U`, with subscribers that receive the current snapshot on
//! subscribe and every subsequently flushed diff afterwards.
//!
//! This is deliberately *not* its own actor: it is an operation set
//! (`subscribe`, `update`, `flush_diffs`) that the owning actor (watcher,
//! parser, evaluator) calls from within its own message loop, batching
//! several `update()` calls into one `flush_diffs()` so subscribers never
//! observe an intermediate, half-applied state.

use tokio::sync::mpsc;

use crate::actor::Sink;
use crate::monoid::Monoid;

/// `S` state, `U` the monoidal diff type describing changes to it.
pub struct IncrementalServer<S, U> {
    state: S,
    pending: U,
    subscribers: Vec<Box<dyn Sink<U>>>,
}

impl<S: Clone, U: Monoid + Clone + Send + 'static> IncrementalServer<S, U> {
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            pending: U::mempty(),
            subscribers: Vec::new(),
        }
    }

    /// Current state, ignoring anything still pending.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Register a subscriber and return the state it should start from. No
    /// diff can be lost between this snapshot and the first update the
    /// subscriber receives, because it is registered before this call
    /// returns.
    pub fn subscribe(&mut self, subscriber: impl Sink<U> + 'static) -> S {
        self.subscribers.push(Box::new(subscriber));
        self.state.clone()
    }

    /// Convenience over [`Self::subscribe`] for callers that just want a
    /// channel to read diffs from, rather than routing them into another
    /// actor's mailbox.
    pub fn subscribe_channel(&mut self) -> (S, mpsc::UnboundedReceiver<U>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let snapshot = self.subscribe(tx);
        (snapshot, rx)
    }

    /// Buffer `u` into the pending accumulator without broadcasting yet.
    pub fn update(&mut self, u: U) {
        self.pending = self.pending.combine(&u);
    }
}

impl<S, U: Monoid + Clone> IncrementalServer<S, U> {
    /// Apply the pending diff to the state, broadcast it to every
    /// subscriber, and reset pending back to the identity. Must be called
    /// after a coherent batch of `update()`s so subscribers never see an
    /// intermediate state.
    pub fn flush_diffs(&mut self, apply: impl Fn(&mut S, &U)) {
        apply(&mut self.state, &self.pending);
        for sub in &self.subscribers {
            sub.send(self.pending.clone());
        }
        self.pending = U::mempty();
    }
}
