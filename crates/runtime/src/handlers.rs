//! Generic callback handler infrastructure.
//!
//! Handlers are stored as [`HandlerEntry<E>`] in an [`IndexMap`] keyed by
//! [`HandlerId`], giving O(1) removal and stable insertion order. Dispatch
//! runs handlers in registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Unique identifier for event handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
    NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Handler function: `&E` → `()`. Invoked synchronously from inside a pump.
pub type HandlerFn<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Event handler entry.
pub struct HandlerEntry<E> {
    pub id: HandlerId,
    pub handler: HandlerFn<E>,
}

impl<E> Clone for HandlerEntry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Handler storage: [`IndexMap`] for O(1) removal with stable insertion order.
pub type HandlerMap<E> = Arc<Mutex<IndexMap<HandlerId, HandlerEntry<E>>>>;

/// Creates an empty handler map.
pub fn handler_map<E>() -> HandlerMap<E> {
    Arc::new(Mutex::new(IndexMap::new()))
}

/// Registers `handler` and returns its ID.
pub fn insert_handler<E>(map: &HandlerMap<E>, handler: HandlerFn<E>) -> HandlerId {
    let id = next_handler_id();
    map.lock().insert(id, HandlerEntry { id, handler });
    id
}

/// Runs every handler in `map` with `event`.
///
/// The entries are cloned out first so a handler may subscribe or unsubscribe
/// without deadlocking.
pub fn dispatch<E>(map: &HandlerMap<E>, event: &E) -> usize {
    let entries: Vec<HandlerEntry<E>> = map.lock().values().cloned().collect();
    for entry in &entries {
        (entry.handler)(event);
    }
    entries.len()
}

/// RAII handle that unregisters an event handler on drop.
///
/// Holds a weak reference to the handler map, so dropping after the owning
/// capability set is gone is a no-op.
pub struct Subscription {
    id: HandlerId,
    dropper: Option<Arc<dyn Fn(HandlerId) + Send + Sync>>,
}

impl Subscription {
    /// Creates a subscription with a custom dropper function.
    pub fn new(id: HandlerId, dropper: Arc<dyn Fn(HandlerId) + Send + Sync>) -> Self {
        Self {
            id,
            dropper: Some(dropper),
        }
    }

    /// Creates a subscription from a handler map using a weak reference.
    pub fn from_handler_map<E>(id: HandlerId, handlers: &HandlerMap<E>) -> Self
    where
        E: 'static,
    {
        let weak: Weak<Mutex<IndexMap<HandlerId, HandlerEntry<E>>>> = Arc::downgrade(handlers);
        let dropper = Arc::new(move |id: HandlerId| {
            if let Some(map) = weak.upgrade() {
                map.lock().shift_remove(&id);
            }
        });
        Self::new(id, dropper)
    }

    /// Returns this subscription's handler ID.
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Explicitly unsubscribes. Equivalent to dropping.
    pub fn unsubscribe(mut self) {
        if let Some(dropper) = self.dropper.take() {
            (dropper)(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dropper) = self.dropper.take() {
            (dropper)(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.dropper.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_handler_id_increments() {
        let id1 = next_handler_id();
        let id2 = next_handler_id();
        assert!(id2 > id1);
    }

    #[test]
    fn test_dispatch_runs_in_registration_order() {
        let map: HandlerMap<i32> = handler_map();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            insert_handler(&map, Arc::new(move |v: &i32| seen.lock().push((tag, *v))));
        }

        assert_eq!(dispatch(&map, &7), 2);
        assert_eq!(*seen.lock(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_subscription_drop_removes_handler() {
        let map: HandlerMap<String> = handler_map();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let id = insert_handler(
            &map,
            Arc::new(move |_: &String| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        {
            let _sub = Subscription::from_handler_map(id, &map);
            dispatch(&map, &"x".to_string());
        }
        dispatch(&map, &"y".to_string());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(map.lock().is_empty());
    }

    #[test]
    fn test_subscription_weak_reference() {
        let map: HandlerMap<String> = handler_map();
        let id = insert_handler(&map, Arc::new(|_: &String| {}));
        let sub = Subscription::from_handler_map(id, &map);

        drop(map);

        // Dropping subscription should not panic (weak ref is dead)
        drop(sub);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_dispatch() {
        let map: HandlerMap<()> = handler_map();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_clone = Arc::clone(&slot);
        let id = insert_handler(
            &map,
            Arc::new(move |_: &()| {
                slot_clone.lock().take();
            }),
        );
        *slot.lock() = Some(Subscription::from_handler_map(id, &map));

        dispatch(&map, &());

        assert!(map.lock().is_empty());
    }
}
