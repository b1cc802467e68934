//! Minimal single-threaded actor runtime.
//!
//! Each actor owns a typed inbox and processes it serially on its own
//! `tokio` task; it never reaches into another actor's state directly.
//! Coordination is entirely by sending messages to a [`Mailbox`].

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

/// A handle through which messages of type `M` can be enqueued.
///
/// Delivery is reliable and at-most-once within the process; messages from
/// one sender to one mailbox are delivered in the order they were sent.
pub struct Mailbox<M> {
    tx: mpsc::UnboundedSender<M>,
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Mailbox {
            tx: self.tx.clone(),
        }
    }
}

impl<M: Send + 'static> Mailbox<M> {
    /// Enqueue a message. Non-blocking; silently dropped if the actor has
    /// already shut down (its receiver half was dropped).
    pub fn send(&self, msg: M) {
        let _ = self.tx.send(msg);
    }

    /// Narrow this mailbox to accept a different message type `N`, wrapping
    /// every sent `N` into an `M` via `lift` before forwarding it on. This
    /// is how a parser subscribes to a watcher's mailbox (wrapping the
    /// watcher's `Overwrite<String>` into its own message enum) and how an
    /// actor hands worker tasks a way to report completion back into its
    /// own inbox.
    pub fn lift<N>(&self, lift: impl Fn(N) -> M + Send + Sync + 'static) -> Lifted<M, N> {
        Lifted {
            target: self.clone(),
            lift: Arc::new(lift),
        }
    }
}

/// A [`Mailbox`] narrowed to a different message type via a lifting
/// closure. Cheap to clone and to pass into spawned worker tasks.
pub struct Lifted<M, N> {
    target: Mailbox<M>,
    lift: Arc<dyn Fn(N) -> M + Send + Sync>,
}

impl<M, N> Clone for Lifted<M, N> {
    fn clone(&self) -> Self {
        Lifted {
            target: self.target.clone(),
            lift: self.lift.clone(),
        }
    }
}

impl<M: Send + 'static, N> Lifted<M, N> {
    pub fn send(&self, msg: N) {
        self.target.send((self.lift)(msg));
    }
}

/// A send target for messages of type `M`: a [`Mailbox`], a [`Lifted`]
/// mailbox, or a raw channel sender. [`crate::incremental::IncrementalServer`]
/// stores subscribers as `Box<dyn Sink<U>>` so any of these can register
/// directly as "something diffs can be sent to," without caring whether the
/// other end is an actor's mailbox or a bare channel.
pub trait Sink<M>: Send + Sync {
    fn send(&self, msg: M);
}

impl<M: Send + 'static> Sink<M> for Mailbox<M> {
    fn send(&self, msg: M) {
        Mailbox::send(self, msg)
    }
}

impl<M: Send + 'static> Sink<M> for mpsc::UnboundedSender<M> {
    fn send(&self, msg: M) {
        let _ = mpsc::UnboundedSender::send(self, msg);
    }
}

impl<M: Send + 'static, N: Send + 'static> Sink<N> for Lifted<M, N> {
    fn send(&self, msg: N) {
        Lifted::send(self, msg)
    }
}

/// Spawn an actor: allocate its inbox, hand the behavior its own mailbox
/// (for self-addressing and for handing to worker tasks it spawns), and
/// drive the resulting future on a fresh `tokio` task.
///
/// Returns the mailbox other actors use to send this one messages.
pub fn launch_actor<M, F, Fut>(behavior: F) -> Mailbox<M>
where
    M: Send + 'static,
    F: FnOnce(mpsc::UnboundedReceiver<M>, Mailbox<M>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let mailbox = Mailbox { tx };
    let self_mailbox = mailbox.clone();
    tokio::spawn(behavior(rx, self_mailbox));
    mailbox
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Msg {
        Ping(u32),
        Sum(u32),
    }

    #[tokio::test]
    async fn mailbox_delivers_in_order() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let mb = launch_actor(move |mut rx: mpsc::UnboundedReceiver<Msg>, _self_mb| {
            let done_tx = done_tx.clone();
            async move {
                let mut total = 0u32;
                while let Some(msg) = rx.recv().await {
                    match msg {
                        Msg::Ping(n) => total += n,
                        Msg::Sum(expected) => {
                            let _ = done_tx.send(total == expected);
                        }
                    }
                }
            }
        });

        mb.send(Msg::Ping(1));
        mb.send(Msg::Ping(2));
        mb.send(Msg::Ping(3));
        mb.send(Msg::Sum(6));

        assert_eq!(done_rx.recv().await, Some(true));
    }

    #[tokio::test]
    async fn lifted_mailbox_wraps_messages() {
        enum Outer {
            Inner(u32),
        }

        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let outer = launch_actor(move |mut rx: mpsc::UnboundedReceiver<Outer>, _self_mb| {
            let done_tx = done_tx.clone();
            async move {
                while let Some(Outer::Inner(n)) = rx.recv().await {
                    let _ = done_tx.send(n);
                }
            }
        });

        let lifted: Lifted<Outer, u32> = outer.lift(Outer::Inner);
        lifted.send(42);

        assert_eq!(done_rx.recv().await, Some(42));
    }
}
