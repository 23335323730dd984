//! Browser state registry keyed by engine identifier.
//!
//! Uses [`DashMap`] so the registry can be shared between the lifecycle
//! controller and the before-close handlers the engine invokes while pumping.
//! Entries exist from creation until the engine confirms the close; an
//! identifier with no entry reads as [`BrowserState::Closed`].
//!
//! The engine may hand a closed instance's identifier to a later browser, so
//! each instance owns its state in a [`BrowserSlot`]. The registry only points
//! at the slot while the instance is open; a confirmed close marks the slot
//! `Closed` for good before the identifier is released.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Lifecycle of one browser instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserState {
    /// Creation requested, identifier not yet confirmed.
    Requested,
    /// Accepts commands.
    Live,
    /// Close requested, waiting for the engine to confirm.
    Closing,
    /// Terminal.
    Closed,
}

impl BrowserState {
    /// Returns true until the engine has confirmed the close.
    pub fn is_active(self) -> bool {
        !matches!(self, BrowserState::Closed)
    }
}

impl fmt::Display for BrowserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BrowserState::Requested => "Requested",
            BrowserState::Live => "Live",
            BrowserState::Closing => "Closing",
            BrowserState::Closed => "Closed",
        };
        f.write_str(s)
    }
}

/// State of one browser instance, shared by every clone of its handle.
#[derive(Clone)]
pub struct BrowserSlot {
    id: i32,
    state: Arc<Mutex<BrowserState>>,
}

impl BrowserSlot {
    fn new(id: i32) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(BrowserState::Requested)),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn state(&self) -> BrowserState {
        *self.state.lock()
    }

    /// Moves the instance from `from` to `to`; `operation` labels the error otherwise.
    pub fn transition(&self, from: BrowserState, to: BrowserState, operation: &'static str) -> Result<()> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(Error::invalid_state(operation, *state));
        }
        debug!(target: "cef_host", browser_id = self.id, %from, %to, "browser state");
        *state = to;
        Ok(())
    }

    /// Fails unless the instance is live.
    pub fn ensure_live(&self, operation: &'static str) -> Result<()> {
        match self.state() {
            BrowserState::Live => Ok(()),
            other => Err(Error::invalid_state(operation, other)),
        }
    }

    /// Returns true if both slots belong to the same instance.
    pub fn same_instance(&self, other: &BrowserSlot) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn close(&self) -> BrowserState {
        std::mem::replace(&mut *self.state.lock(), BrowserState::Closed)
    }
}

impl fmt::Debug for BrowserSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSlot")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Registry of open browser instances by identifier.
#[derive(Default)]
pub struct BrowserRegistry {
    open: DashMap<i32, BrowserSlot>,
}

impl BrowserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a creation request for `id` and returns the new instance's slot.
    ///
    /// Fails if `id` belongs to an instance that has not closed yet.
    pub fn register(&self, id: i32) -> Result<BrowserSlot> {
        if id < 0 {
            return Err(Error::BrowserCreation(format!("engine returned negative identifier {id}")));
        }
        match self.open.entry(id) {
            Entry::Occupied(existing) => Err(Error::BrowserCreation(format!(
                "identifier {id} already belongs to a {} browser",
                existing.get().state()
            ))),
            Entry::Vacant(entry) => {
                let slot = BrowserSlot::new(id);
                entry.insert(slot.clone());
                Ok(slot)
            }
        }
    }

    /// State of the open instance holding `id`, or `Closed` if there is none.
    pub fn state(&self, id: i32) -> BrowserState {
        self.open
            .get(&id)
            .map(|slot| slot.value().state())
            .unwrap_or(BrowserState::Closed)
    }

    /// Engine confirmed the close: the instance is `Closed`, whatever its
    /// state, and `id` is free for a later browser.
    pub fn mark_closed(&self, id: i32) {
        if let Some((_, slot)) = self.open.remove(&id) {
            let previous = slot.close();
            debug!(target: "cef_host", browser_id = id, from = %previous, "browser closed");
        }
    }

    /// Forgets a creation that did not go through.
    pub fn discard(&self, slot: &BrowserSlot) {
        self.open.remove_if(&slot.id, |_, open| open.same_instance(slot));
        slot.close();
    }

    /// Number of instances not yet closed.
    pub fn active_count(&self) -> usize {
        self.open.len()
    }

    /// Identifiers of instances not yet closed, in ascending order.
    pub fn active_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.open.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_runs_through_every_state() {
        let registry = BrowserRegistry::new();

        let slot = registry.register(1).unwrap();
        assert_eq!(slot.state(), BrowserState::Requested);
        slot.transition(BrowserState::Requested, BrowserState::Live, "create").unwrap();
        slot.ensure_live("reload").unwrap();
        slot.transition(BrowserState::Live, BrowserState::Closing, "close").unwrap();
        assert!(slot.ensure_live("reload").unwrap_err().is_invalid_state());
        assert_eq!(registry.state(1), BrowserState::Closing);

        registry.mark_closed(1);
        assert_eq!(slot.state(), BrowserState::Closed);
        assert_eq!(registry.state(1), BrowserState::Closed);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn duplicate_live_identifier_is_refused() {
        let registry = BrowserRegistry::new();
        registry.register(3).unwrap();

        let err = registry.register(3).unwrap_err();
        assert!(matches!(err, Error::BrowserCreation(_)));

        registry.mark_closed(3);
        registry.register(3).unwrap();
    }

    #[test]
    fn reused_identifier_does_not_revive_closed_instance() {
        let registry = BrowserRegistry::new();
        let first = registry.register(7).unwrap();
        first
            .transition(BrowserState::Requested, BrowserState::Live, "create")
            .unwrap();
        registry.mark_closed(7);

        let second = registry.register(7).unwrap();
        second
            .transition(BrowserState::Requested, BrowserState::Live, "create")
            .unwrap();

        assert_eq!(first.state(), BrowserState::Closed);
        assert!(first.ensure_live("reload").unwrap_err().is_invalid_state());
        assert!(!first.same_instance(&second));
        second.ensure_live("reload").unwrap();
    }

    #[test]
    fn discard_frees_the_identifier() {
        let registry = BrowserRegistry::new();
        let slot = registry.register(4).unwrap();

        registry.discard(&slot);

        assert_eq!(slot.state(), BrowserState::Closed);
        assert_eq!(registry.active_count(), 0);
        registry.register(4).unwrap();
    }

    #[test]
    fn negative_identifier_is_refused() {
        assert!(BrowserRegistry::new().register(-1).is_err());
    }

    #[test]
    fn transition_from_wrong_state_reports_current_state() {
        let registry = BrowserRegistry::new();
        let slot = registry.register(2).unwrap();

        let err = slot
            .transition(BrowserState::Live, BrowserState::Closing, "close the browser")
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid state: cannot close the browser while Requested");
    }

    #[test]
    fn active_ids_are_sorted() {
        let registry = BrowserRegistry::new();
        for id in [9, 2, 5] {
            registry.register(id).unwrap();
        }
        assert_eq!(registry.active_ids(), vec![2, 5, 9]);
    }
}
