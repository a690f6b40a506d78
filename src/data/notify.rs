//! Change notification for in-place matrix mutation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Fires a no-argument "matrix changed" signal to registered listeners.
///
/// Every bulk mutating operation calls [`notify`](Self::notify) exactly once
/// after it has finished writing. The generation counter lets caches detect
/// staleness without registering a listener.
///
/// Cloning a notifier produces a fresh one: listeners are bound to the
/// matrix instance they subscribed to, not to its copies.
#[derive(Default)]
pub struct ChangeNotifier {
    generation: AtomicU64,
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl ChangeNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning an id usable for unsubscription.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Bump the generation and call every listener in subscription order.
    pub fn notify(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
        for (_, listener) in &self.listeners {
            listener();
        }
    }

    /// Number of notifications fired so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Number of registered listeners.
    pub fn n_listeners(&self) -> usize {
        self.listeners.len()
    }
}

impl Clone for ChangeNotifier {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("generation", &self.generation())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_calls_listeners() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut notifier = ChangeNotifier::new();
        let counter = Arc::clone(&hits);
        notifier.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify();
        notifier.notify();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.generation(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut notifier = ChangeNotifier::new();
        let counter = Arc::clone(&hits);
        let id = notifier.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clone_drops_listeners() {
        let mut notifier = ChangeNotifier::new();
        notifier.subscribe(|| {});
        notifier.notify();

        let copy = notifier.clone();
        assert_eq!(copy.n_listeners(), 0);
        assert_eq!(copy.generation(), 0);
    }
}
