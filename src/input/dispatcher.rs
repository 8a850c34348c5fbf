//=========================================================================
// Event Dispatcher
//=========================================================================
//
// Bridges native push-callbacks into Rust subscribers.
//
// Architecture:
// ```text
//   native thread ──> event_trampoline(&raw)
//                          │  snapshot of LIVE_DISPATCHERS
//                          ↓
//                     EventDispatcher::dispatch(EventType)   (each attached one)
//                          │  snapshot under read lock, lock released
//                          ↓
//                     subscriber 1, subscriber 2, ... (registration order)
// ```
//
// Threading:
// The engine picks the calling thread. Delivery is not serialized
// against polling or against other deliveries, so subscribers must be
// `Send + Sync` and synchronize their own state.
//
// Routing:
// The native callback receives only a pointer to the event type; there
// is no user-data argument. The trampoline therefore fans out to every
// dispatcher in a process-wide registry. With one Game per process this
// is exactly its own input system. Several live input systems in one
// process would each see every pushed event.
//
// Lifetime:
// The native module offers no way to unregister. The trampoline is a
// plain `fn` item and the registry holds only weak references, so a late
// invocation after detach finds nothing to deliver to.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use log::{error, trace, warn};

//=== Internal Dependencies ===============================================

use super::event::EventType;

//=== Subscriber ==========================================================

/// Callback invoked for every event pushed by the engine.
pub type Subscriber = Arc<dyn Fn(EventType) + Send + Sync>;

/// Token identifying one subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

//=== Registry ============================================================

/// Dispatchers currently attached to the engine callback.
static LIVE_DISPATCHERS: RwLock<Vec<Weak<EventDispatcher>>> = RwLock::new(Vec::new());

fn live_dispatchers() -> Vec<Arc<EventDispatcher>> {
    LIVE_DISPATCHERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter_map(Weak::upgrade)
        .collect()
}

//=== EventDispatcher =====================================================

/// Thread-safe broadcast list of subscribers.
pub(crate) struct EventDispatcher {
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_id: AtomicU64,
    detached: AtomicBool,
}

impl EventDispatcher {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::with_capacity(4)),
            next_id: AtomicU64::new(0),
            detached: AtomicBool::new(false),
        }
    }

    //--- Subscription -----------------------------------------------------

    pub(crate) fn subscribe(&self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, subscriber));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    //--- Delivery ---------------------------------------------------------

    /// Invokes every subscriber with `event_type`, in registration order.
    ///
    /// A panicking subscriber is logged and skipped; the remaining
    /// subscribers still run.
    pub(crate) fn dispatch(&self, event_type: EventType) {
        if self.is_detached() {
            trace!(target: "input", "Dropping {} for detached input system", event_type);
            return;
        }

        let snapshot: Vec<Subscriber> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        trace!(target: "input", "Dispatching {} to {} subscriber(s)", event_type, snapshot.len());

        for subscriber in snapshot {
            if panic::catch_unwind(AssertUnwindSafe(|| subscriber(event_type))).is_err() {
                error!(target: "input", "Event subscriber panicked while handling {}", event_type);
            }
        }
    }

    //--- Registration -----------------------------------------------------

    /// Makes this dispatcher reachable from [`event_trampoline`].
    pub(crate) fn attach(self: &Arc<Self>) {
        let mut live = LIVE_DISPATCHERS.write().unwrap_or_else(PoisonError::into_inner);
        live.retain(|entry| entry.strong_count() > 0);
        live.push(Arc::downgrade(self));
    }

    /// Drops all subscribers and leaves the registry; later native
    /// invocations are ignored.
    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::Release);
        self.subscribers.write().unwrap_or_else(PoisonError::into_inner).clear();

        let this: *const Self = self;
        LIVE_DISPATCHERS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|entry| entry.strong_count() > 0 && entry.as_ptr() != this);
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.len())
            .field("detached", &self.is_detached())
            .finish()
    }
}

//=== Trampoline ==========================================================

/// The single function registered with the engine.
///
/// # Safety
///
/// `event_type` must be null or point to an `i32` readable for the
/// duration of the call.
pub(crate) unsafe extern "C" fn event_trampoline(event_type: *const i32) {
    if event_type.is_null() {
        warn!(target: "input", "Native callback invoked with a null event pointer; ignored");
        return;
    }

    // SAFETY: non-null and valid for this call per the contract above.
    let raw = unsafe { event_type.read_unaligned() };

    let event_type = match EventType::from_raw(raw) {
        Ok(event_type) => event_type,
        Err(e) => {
            warn!(target: "input", "Native callback dropped: {}", e);
            return;
        }
    };

    let targets = live_dispatchers();
    if targets.is_empty() {
        trace!(target: "input", "No input system attached for {}", event_type);
    }
    for dispatcher in targets {
        dispatcher.dispatch(event_type);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
