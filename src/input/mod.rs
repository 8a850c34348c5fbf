//=========================================================================
// Input System
//
// Rust-side owner of the engine's input subsystem.
//
// Responsibilities:
// - Register the event trampoline with the engine (once, irreversibly)
// - Poll pending event records on demand
// - Fan pushed events out to subscribers (closures or channels)
//
// Notes:
// The subsystem's memory belongs to the engine. This wrapper owns only
// the subscription; dropping it detaches subscribers and releases
// nothing native. Created and cached by `Game::input_system`.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod dispatcher;
pub mod event;

//=== External Crates =====================================================

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info, trace};

//=== Internal Imports ====================================================

use crate::error::{BindingError, Result};
use crate::native::{AtomicHandle, GameRole, InputSystemHandle, NativeEngine};
use dispatcher::{event_trampoline, EventDispatcher};
pub use dispatcher::{Subscriber, SubscriptionId};
pub use event::{Event, EventType};

//=== InputSystem =========================================================

/// Poll and push interface to the engine's input events.
///
/// # Threading
///
/// Subscribers run on whichever thread the engine delivers from, possibly
/// concurrently with [`InputSystem::poll_event`] on another thread. They
/// must be `Send + Sync` and guard any shared state themselves.
pub struct InputSystem {
    engine: Arc<dyn NativeEngine>,
    handle: InputSystemHandle,
    owner: Arc<AtomicHandle<GameRole>>,
    dispatcher: Arc<EventDispatcher>,
}

impl InputSystem {
    //--- Construction -----------------------------------------------------

    /// Wraps `handle` and registers the event trampoline with the engine.
    ///
    /// Fails with `InvalidHandle` if `handle` is null, in which case
    /// nothing is registered.
    pub(crate) fn new(
        engine: Arc<dyn NativeEngine>,
        handle: InputSystemHandle,
        owner: Arc<AtomicHandle<GameRole>>,
    ) -> Result<Self> {
        let handle = handle.validate()?;
        let dispatcher = Arc::new(EventDispatcher::new());

        // Attach first: the engine may push as soon as the callback is in.
        dispatcher.attach();
        debug!(target: "input", "Registering event callback for {:?}", handle);
        engine.register_event_callback(handle, event_trampoline);
        info!(target: "input", "Input system ready, event callback registered");

        Ok(Self {
            engine,
            handle,
            owner,
            dispatcher,
        })
    }

    //--- Polling ----------------------------------------------------------

    /// Returns the next pending event, or `None` if nothing is pending.
    ///
    /// The returned [`Event`] cannot outlive `self`, but the engine only
    /// guarantees its record until the next poll. Nothing stops a second
    /// `poll_event` while an earlier `Event` is still held; querying the
    /// earlier one after that reads a stale record. Fails with
    /// `InvalidState` once the owning game has been disposed.
    pub fn poll_event(&self) -> Result<Option<Event<'_>>> {
        self.ensure_live()?;

        let raw = self.engine.poll_event(self.handle);
        if !raw.is_valid() {
            return Ok(None);
        }

        trace!(target: "input", "Polled {:?}", raw);
        Event::new(raw, self.engine.as_ref()).map(Some)
    }

    /// Drains all pending events, decoding each one's type.
    ///
    /// Stops after the first error.
    pub fn poll_events(&self) -> PollEvents<'_> {
        PollEvents {
            input: self,
            done: false,
        }
    }

    //--- Subscription -----------------------------------------------------

    /// Adds a subscriber for events pushed by the engine.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(EventType) + Send + Sync + 'static,
    {
        let id = self.dispatcher.subscribe(Arc::new(subscriber));
        debug!(target: "input", "Subscriber {:?} added", id);
        id
    }

    /// Removes a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.dispatcher.unsubscribe(id);
        if removed {
            debug!(target: "input", "Subscriber {:?} removed", id);
        }
        removed
    }

    /// Forwards every pushed event into an unbounded channel.
    ///
    /// Lets a consumer thread receive events without sharing state with
    /// the engine's delivery thread. Delivery continues until the input
    /// system is dropped; a dropped receiver is tolerated.
    pub fn subscribe_channel(&self) -> Receiver<EventType> {
        let (tx, rx) = unbounded();
        self.subscribe(move |event_type| {
            if tx.send(event_type).is_err() {
                trace!(target: "input", "Channel subscriber gone, dropping {}", event_type);
            }
        });
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.dispatcher.len()
    }

    //--- Accessors --------------------------------------------------------

    /// Underlying native handle, for diagnostics.
    pub fn handle(&self) -> InputSystemHandle {
        self.handle
    }

    /// Stops delivery to subscribers. Idempotent.
    pub(crate) fn detach(&self) {
        if !self.dispatcher.is_detached() {
            self.dispatcher.detach();
            debug!(target: "input", "Input system detached");
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.owner.is_released() {
            return Err(BindingError::InvalidState { what: "input system" });
        }
        Ok(())
    }
}

impl Drop for InputSystem {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for InputSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSystem")
            .field("handle", &self.handle)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

//=== PollEvents ==========================================================

/// Iterator returned by [`InputSystem::poll_events`].
pub struct PollEvents<'a> {
    input: &'a InputSystem,
    done: bool,
}

impl Iterator for PollEvents<'_> {
    type Item = Result<EventType>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = match self.input.poll_event() {
            Ok(Some(event)) => event.event_type(),
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };

        self.done = result.is_err();
        Some(result)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
