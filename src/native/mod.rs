//=========================================================================
// Native Engine Interface
//=========================================================================
//
// The operation table of the external engine module.
//
// Everything the binding layer knows about the engine goes through
// `NativeEngine`. The production implementation (`DynamicEngine`) loads
// the shared library at runtime and calls its C entry points; tests use
// a conformance double that honours the same null-return conventions.
//
//   Operation                 Null result means
//   ───────────────────────   ─────────────────────
//   create_game               creation failed
//   game_input_system         subsystem unavailable
//   poll_event                no event pending
//
//=========================================================================

//=== Module Declarations =================================================

pub mod handle;
mod library;

#[cfg(test)]
pub(crate) mod stub;

//=== External Dependencies ===============================================

use std::ffi::CStr;

//=== Public API ==========================================================

pub use handle::{
    AtomicHandle, EventHandle, EventRole, GameHandle, GameRole, HandleRole, InputSystemHandle,
    InputSystemRole, NativeHandle,
};
pub use library::{DynamicEngine, ENGINE_LIBRARY_ENV, ENGINE_LIBRARY_NAME};

//=== EventCallbackFn =====================================================

/// C signature of the function registered with the input subsystem.
///
/// The engine passes the event type by reference; the pointer is valid
/// only for the duration of the call.
pub type EventCallbackFn = unsafe extern "C" fn(event_type: *const i32);

//=== NativeEngine ========================================================

/// Entry points exposed by the native engine module.
///
/// The binding layer only ever passes handles that this same engine
/// returned and that passed [`NativeHandle::validate`]. Implementations
/// must be callable from any thread: the engine may deliver callbacks on
/// its own threads while the caller keeps polling.
pub trait NativeEngine: Send + Sync {
    /// Creates an engine instance with a window titled `window_title`.
    fn create_game(&self, window_title: &CStr) -> GameHandle;

    /// Releases an engine instance. Called at most once per handle.
    fn destroy_game(&self, game: GameHandle);

    /// Runs the engine loop; blocks until the session ends.
    fn run_game(&self, game: GameHandle);

    /// Returns the engine-owned input subsystem of `game`.
    fn game_input_system(&self, game: GameHandle) -> InputSystemHandle;

    /// Returns the next pending event, or a null handle.
    fn poll_event(&self, input: InputSystemHandle) -> EventHandle;

    /// Registers `callback` to be invoked for pushed events.
    fn register_event_callback(&self, input: InputSystemHandle, callback: EventCallbackFn);

    /// Returns the raw `EventType` encoding of an event record.
    fn event_type(&self, event: EventHandle) -> i32;
}
