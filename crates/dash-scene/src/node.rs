//! Reactive state container
//!
//! A [`SceneNode`] holds plain state behind a lock and publishes a revision
//! counter on every write. Consumers either read the state on demand or wait
//! on the revision channel. Activation is reference counted: each call to
//! [`SceneNode::activate`] returns a [`Deactivation`] guard and the node stays
//! active until every guard has been released.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Reactive holder of a state value
pub struct SceneNode<S> {
    state: RwLock<S>,
    revision: watch::Sender<u64>,
    active: Arc<AtomicUsize>,
}

impl<S: Clone> SceneNode<S> {
    /// Create node with initial state
    #[must_use]
    pub fn new(state: S) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(state),
            revision,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> S {
        self.state.read().clone()
    }

    /// Read through a closure without cloning
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.read())
    }

    /// Replace the whole state
    pub fn set_state(&self, state: S) {
        *self.state.write() = state;
        self.bump();
    }

    /// Mutate in place; subscribers are notified once
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let out = f(&mut self.state.write());
        self.bump();
        out
    }

    /// Revision channel, incremented on every write
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Activate the node; `on_deactivate` runs when the guard is released
    pub fn activate<F>(&self, on_deactivate: F) -> Deactivation
    where
        F: FnOnce() + Send + 'static,
    {
        self.active.fetch_add(1, Ordering::SeqCst);
        Deactivation {
            active: Arc::clone(&self.active),
            teardown: Some(Box::new(on_deactivate)),
        }
    }

    /// Whether at least one activation is live
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl<S: fmt::Debug> fmt::Debug for SceneNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("state", &*self.state.read())
            .field("revision", &*self.revision.borrow())
            .field("active", &self.active.load(Ordering::SeqCst))
            .finish()
    }
}

/// Teardown guard returned by `activate`
///
/// Dropping the guard deactivates; [`Deactivation::deactivate`] does the same
/// explicitly.
#[must_use = "dropping the guard deactivates immediately"]
pub struct Deactivation {
    active: Arc<AtomicUsize>,
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Deactivation {
    /// Deactivate now
    pub fn deactivate(mut self) {
        self.release();
    }

    /// Chain another teardown after this one
    pub fn and_then<F>(mut self, next: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let first = self.teardown.take();
        self.teardown = Some(Box::new(move || {
            if let Some(first) = first {
                first();
            }
            next();
        }));
        self
    }

    fn release(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            self.active.fetch_sub(1, Ordering::SeqCst);
            teardown();
        }
    }
}

impl Drop for Deactivation {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Deactivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deactivation")
            .field("pending", &self.teardown.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn updates_bump_revision() {
        let node = SceneNode::new(1_u32);
        let rx = node.subscribe();
        node.update(|s| *s += 1);
        node.set_state(10);

        assert_eq!(node.state(), 10);
        assert_eq!(*rx.borrow(), 2);
        assert_eq!(node.read(|s| *s * 2), 20);
    }

    #[test]
    fn activation_is_reference_counted() {
        let node = SceneNode::new(());
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&torn_down);

        let first = node.activate(move || flag.store(true, Ordering::SeqCst));
        let second = node.activate(|| {});
        assert!(node.is_active());

        first.deactivate();
        assert!(torn_down.load(Ordering::SeqCst));
        assert!(node.is_active());

        drop(second);
        assert!(!node.is_active());
    }

    #[tokio::test]
    async fn subscribers_wake_on_change() {
        let node = Arc::new(SceneNode::new(0_i32));
        let mut rx = node.subscribe();
        let writer = Arc::clone(&node);
        tokio::spawn(async move { writer.set_state(5) });

        rx.changed().await.unwrap();
        assert_eq!(node.state(), 5);
    }
}
