//=========================================================================
// Input Event Types
//
// Rust-side view of the engine's event records.
//
// Responsibilities:
// - Mirror the native `EventType` enumeration bit-for-bit (ABI contract)
// - Wrap a polled event handle without ever dereferencing it
// - Provide coarse categorization for callers that route by device
//
// Lifetime:
// ```text
// InputSystem::poll_event(&self) ──> Event<'_>
//                                      │
//                                      ├─ cannot outlive the InputSystem
//                                      └─ record valid until the next poll
//                                         (not checked: polling again only
//                                         needs another shared borrow)
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::error::{BindingError, Result};
use crate::native::{EventHandle, NativeEngine};

//=== EventType ===========================================================

/// Kind of an engine event.
///
/// The discriminants are the wire encoding shared with the native module
/// and must never be reordered. `Count` is a sentinel, not an event.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    //--- Window -----------------------------------------------------------
    Closed = 0,
    Resized = 1,
    LostFocus = 2,
    GainedFocus = 3,

    //--- Keyboard ---------------------------------------------------------
    TextEntered = 4,
    KeyPressed = 5,
    KeyReleased = 6,

    //--- Mouse ------------------------------------------------------------
    /// Deprecated by the engine in favour of `MouseWheelScrolled`.
    MouseWheelMoved = 7,
    MouseWheelScrolled = 8,
    MouseButtonPressed = 9,
    MouseButtonReleased = 10,
    MouseMoved = 11,
    MouseEntered = 12,
    MouseLeft = 13,

    //--- Joystick ---------------------------------------------------------
    JoystickButtonPressed = 14,
    JoystickButtonReleased = 15,
    JoystickMoved = 16,
    JoystickConnected = 17,
    JoystickDisconnected = 18,

    //--- Touch & Sensors --------------------------------------------------
    TouchBegan = 19,
    TouchMoved = 20,
    TouchEnded = 21,
    SensorChanged = 22,

    /// Number of event types. Never produced by the engine.
    Count = 23,
}

impl EventType {
    /// Every real event type in wire order (excludes `Count`).
    pub const ALL: [EventType; EventType::Count as usize] = [
        EventType::Closed,
        EventType::Resized,
        EventType::LostFocus,
        EventType::GainedFocus,
        EventType::TextEntered,
        EventType::KeyPressed,
        EventType::KeyReleased,
        EventType::MouseWheelMoved,
        EventType::MouseWheelScrolled,
        EventType::MouseButtonPressed,
        EventType::MouseButtonReleased,
        EventType::MouseMoved,
        EventType::MouseEntered,
        EventType::MouseLeft,
        EventType::JoystickButtonPressed,
        EventType::JoystickButtonReleased,
        EventType::JoystickMoved,
        EventType::JoystickConnected,
        EventType::JoystickDisconnected,
        EventType::TouchBegan,
        EventType::TouchMoved,
        EventType::TouchEnded,
        EventType::SensorChanged,
    ];

    /// Wire encoding of this event type.
    pub const fn to_raw(self) -> i32 {
        self as i32
    }

    /// Decodes a wire value. The `Count` sentinel is rejected.
    pub fn from_raw(raw: i32) -> Result<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(BindingError::UnknownEventType(raw))
    }

    //--- Categories -------------------------------------------------------

    pub fn is_window(self) -> bool {
        matches!(
            self,
            Self::Closed | Self::Resized | Self::LostFocus | Self::GainedFocus
        )
    }

    pub fn is_keyboard(self) -> bool {
        matches!(self, Self::TextEntered | Self::KeyPressed | Self::KeyReleased)
    }

    pub fn is_mouse(self) -> bool {
        (Self::MouseWheelMoved.to_raw()..=Self::MouseLeft.to_raw()).contains(&self.to_raw())
    }

    pub fn is_joystick(self) -> bool {
        (Self::JoystickButtonPressed.to_raw()..=Self::JoystickDisconnected.to_raw())
            .contains(&self.to_raw())
    }

    pub fn is_touch(self) -> bool {
        matches!(self, Self::TouchBegan | Self::TouchMoved | Self::TouchEnded)
    }
}

impl TryFrom<i32> for EventType {
    type Error = BindingError;

    fn try_from(raw: i32) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<EventType> for i32 {
    fn from(event_type: EventType) -> Self {
        event_type.to_raw()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

//=== Event ===============================================================

/// A single event record returned by [`crate::InputSystem::poll_event`].
///
/// The record lives in engine memory and is only valid until the next
/// poll. The lifetime ties an `Event` to its input system, not to a
/// single poll: a later `poll_event` can run while this value is still
/// held, after which [`Event::event_type`] reads a stale record. Query
/// the type before polling again.
pub struct Event<'a> {
    handle: EventHandle,
    engine: &'a dyn NativeEngine,
}

impl<'a> Event<'a> {
    /// Wraps `handle`; fails with `InvalidHandle` if it is null.
    pub(crate) fn new(handle: EventHandle, engine: &'a dyn NativeEngine) -> Result<Self> {
        let handle = handle.validate()?;
        Ok(Self { handle, engine })
    }

    /// Queries the engine for this record's type.
    pub fn event_type(&self) -> Result<EventType> {
        let handle = self.handle.validate()?;
        EventType::from_raw(self.engine.event_type(handle))
    }

    /// Underlying native handle, for diagnostics.
    pub fn handle(&self) -> EventHandle {
        self.handle
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("handle", &self.handle).finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
