//! Typed publish/subscribe plumbing for the signals the coordinator listens to.
//!
//! A [`Subscription`] is a handle: releasing it twice, or after the emitter
//! has been dropped, does nothing. A listener released while an emission is
//! in flight is skipped for the rest of that emission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::payload::RawShareInput;

pub type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Foreground state reported by the app lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStateStatus {
    Active,
    Inactive,
    Background,
}

/// Whether the native layer currently holds a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeShareState {
    Pending,
    None,
}

/// Notifications coming from the native share module.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    PayloadChanged(RawShareInput),
    ErrorOccurred(String),
    StateChanged(NativeShareState),
}

/// An incoming deep-link URL (`None` when the app was opened without one).
pub type UrlEvent = Option<String>;

/// Anything the coordinator can subscribe to.
pub trait EventSource<E>: Send + Sync {
    fn subscribe(&self, listener: Listener<E>) -> Result<Subscription>;
}

struct Slot<E> {
    id: u64,
    active: AtomicBool,
    listener: Listener<E>,
}

struct Registry<E> {
    next_id: u64,
    slots: Vec<Arc<Slot<E>>>,
}

pub struct EventEmitter<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    pub fn add_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(Box::new(listener))
    }

    fn register(&self, listener: Listener<E>) -> Subscription {
        let slot = {
            let mut registry = self.registry.lock();
            let slot = Arc::new(Slot {
                id: registry.next_id,
                active: AtomicBool::new(true),
                listener,
            });
            registry.next_id += 1;
            registry.slots.push(slot.clone());
            slot
        };

        let registry: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            slot.active.store(false, Ordering::SeqCst);
            if let Some(registry) = registry.upgrade() {
                registry.lock().slots.retain(|s| s.id != slot.id);
            }
        })
    }

    /// Deliver `event` to every active listener. Returns how many were called.
    ///
    /// Listeners run outside the registry lock, so they may subscribe, release
    /// or emit again.
    pub fn emit(&self, event: &E) -> usize {
        let slots = self.registry.lock().slots.clone();
        let mut delivered = 0;
        for slot in slots {
            if slot.active.load(Ordering::SeqCst) {
                (slot.listener)(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().slots.len()
    }
}

impl<E: 'static> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + Sync + 'static> EventSource<E> for EventEmitter<E> {
    fn subscribe(&self, listener: Listener<E>) -> Result<Subscription> {
        Ok(self.register(listener))
    }
}

/// Handle to a registered listener. Released on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
