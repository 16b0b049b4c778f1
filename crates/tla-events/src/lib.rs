use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};

/// Minimal event envelope (RFC3339 time).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Envelope<T> {
    pub time: String,
    pub kind: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(kind: &str, payload: T) -> Self {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        Self {
            time: now,
            kind: kind.to_string(),
            payload,
        }
    }
}

type Handler<T> = dyn Fn(&T) + Send + Sync;

struct Slot<T> {
    id: u64,
    active: AtomicBool,
    handler: Box<Handler<T>>,
}

struct BusInner<T> {
    slots: Mutex<Vec<Arc<Slot<T>>>>,
    next_id: AtomicU64,
}

impl<T> BusInner<T> {
    fn remove(&self, id: u64) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|slot| slot.id != id);
    }
}

/// A synchronous publish/subscribe bus.
///
/// Handlers run on the publishing thread in subscription order. A panicking
/// handler is logged and skipped; the remaining handlers still see the message.
pub struct Bus<T> {
    inner: Arc<BusInner<T>>,
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for Bus<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: 'static> Bus<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                slots: Mutex::new(Vec::with_capacity(capacity)),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a handler. Dropping the returned [`Subscription`] does not
    /// unsubscribe; call [`Subscription::unsubscribe`] explicitly.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot {
            id,
            active: AtomicBool::new(true),
            handler: Box::new(handler),
        });
        let flag: Arc<dyn Liveness> = slot.clone();
        {
            let mut slots = self
                .inner
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            slots.push(slot);
        }
        let weak = Arc::downgrade(&self.inner);
        Subscription {
            state: Arc::new(SubscriptionState {
                id,
                flag,
                remove: Box::new(move |id| {
                    if let Some(inner) = Weak::upgrade(&weak) {
                        inner.remove(id);
                    }
                }),
            }),
        }
    }

    /// Deliver `message` to every handler subscribed at the time of the call.
    /// Returns the number of handlers that ran to completion.
    pub fn publish(&self, message: &T) -> usize {
        let snapshot: Vec<Arc<Slot<T>>> = {
            let slots = self
                .inner
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            slots.clone()
        };
        let mut delivered = 0;
        for slot in snapshot {
            // removed earlier in this same publish
            if !slot.active.load(Ordering::SeqCst) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (slot.handler)(message)));
            match outcome {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::warn!(subscriber = slot.id, "bus handler panicked; continuing");
                }
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

trait Liveness: Send + Sync {
    /// Returns true if this call flipped the slot from active to inactive.
    fn deactivate(&self) -> bool;
    fn is_active(&self) -> bool;
}

impl<T> Liveness for Slot<T> {
    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

struct SubscriptionState {
    id: u64,
    flag: Arc<dyn Liveness>,
    remove: Box<dyn Fn(u64) + Send + Sync>,
}

/// Handle returned by [`Bus::subscribe`]. Cloning shares the same registration.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

impl Subscription {
    /// Remove the handler. Safe to call any number of times, including from
    /// inside the handler while it is being invoked.
    pub fn unsubscribe(&self) {
        if self.state.flag.deactivate() {
            (self.state.remove)(self.state.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.flag.is_active()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.state.id)
            .finish()
    }
}
