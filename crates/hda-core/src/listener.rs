// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Value-change listener registry.
//!
//! A [`Variable`](crate::variable::Variable) owns a [`ListenerRegistry`].
//! Subscribing returns a [`ListenerHandle`]; dropping or disposing the handle
//! removes the listener.
//!
//! ```text
//! Variable::set_value ──► ListenerRegistry::notify ──► callback(&DataValue)
//!                                  ▲
//!               ListenerHandle ────┘ (Drop → unsubscribe)
//! ```
//!
//! Callbacks are invoked outside the registry lock, so a callback may
//! subscribe or unsubscribe without deadlocking.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::types::DataValue;

/// Callback invoked with the new value after a change.
pub type ValueChangeCallback = Arc<dyn Fn(&DataValue) + Send + Sync>;

/// Identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the raw id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

// =============================================================================
// ListenerRegistry
// =============================================================================

/// Registry of value-change callbacks.
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, ValueChangeCallback)>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Registers a callback and returns the handle that keeps it alive.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> ListenerHandle
    where
        F: Fn(&DataValue) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(callback)));

        ListenerHandle {
            id,
            registry: Arc::downgrade(self),
            active: AtomicBool::new(true),
        }
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Invokes every registered callback with `value`.
    pub fn notify(&self, value: &DataValue) {
        let listeners: Vec<ValueChangeCallback> = self
            .listeners
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in listeners {
            callback(value);
        }
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

// =============================================================================
// ListenerHandle
// =============================================================================

/// Disposable registration of a value-change listener.
pub struct ListenerHandle {
    id: ListenerId,
    registry: Weak<ListenerRegistry>,
    active: AtomicBool,
}

impl ListenerHandle {
    /// Returns the listener id.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns `true` until the handle has been disposed.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Unsubscribes the listener. Idempotent.
    pub fn dispose(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(registry) = self.registry.upgrade() {
                registry.unsubscribe(self.id);
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_invokes_listeners() {
        let registry = Arc::new(ListenerRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let _handle = registry.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&DataValue::now(1.0));
        registry.notify(&DataValue::now(2.0));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispose_unsubscribes() {
        let registry = Arc::new(ListenerRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let handle = registry.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(registry.len(), 1);

        handle.dispose();
        handle.dispose();
        assert!(!handle.is_active());
        assert!(registry.is_empty());

        registry.notify(&DataValue::now(1.0));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = Arc::new(ListenerRegistry::new());
        {
            let _handle = registry.subscribe(|_| {});
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = Arc::new(ListenerRegistry::new());
        let handle = registry.subscribe(|_| {});
        drop(registry);
        handle.dispose();
        assert!(!handle.is_active());
    }

    #[test]
    fn test_listener_ids_unique() {
        let registry = Arc::new(ListenerRegistry::new());
        let a = registry.subscribe(|_| {});
        let b = registry.subscribe(|_| {});
        assert_ne!(a.id(), b.id());
    }
}
