//=========================================================================
// Native Handles
//=========================================================================
//
// Typed tokens for engine-side memory.
//
// A handle is only ever compared, copied and passed back to the native
// module; it is never dereferenced on the Rust side. The role parameter
// keeps a game handle from being passed where an event handle belongs.
//
//   NativeHandle<GameRole>        ── owned by Game (via AtomicHandle)
//   NativeHandle<InputSystemRole> ── held by InputSystem, engine-owned
//   NativeHandle<EventRole>       ── transient, valid until next poll
//
//=========================================================================

//=== External Dependencies ===============================================

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

//=== Internal Dependencies ===============================================

use crate::error::{BindingError, Result};

//=== HandleRole ==========================================================

/// Marker trait tagging which native object a handle refers to.
pub trait HandleRole: 'static {
    /// Human-readable role name used in errors and logs.
    const NAME: &'static str;
}

/// Role of the top-level engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameRole {}

/// Role of the engine's input subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSystemRole {}

/// Role of a single polled event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRole {}

impl HandleRole for GameRole {
    const NAME: &'static str = "game";
}

impl HandleRole for InputSystemRole {
    const NAME: &'static str = "input system";
}

impl HandleRole for EventRole {
    const NAME: &'static str = "event";
}

//=== NativeHandle ========================================================

/// Opaque, non-owning, copyable reference to engine memory.
///
/// A null handle is always invalid; use [`NativeHandle::validate`] before
/// handing one to the native module.
#[repr(transparent)]
pub struct NativeHandle<R: HandleRole> {
    raw: *mut c_void,
    _role: PhantomData<R>,
}

pub type GameHandle = NativeHandle<GameRole>;
pub type InputSystemHandle = NativeHandle<InputSystemRole>;
pub type EventHandle = NativeHandle<EventRole>;

impl<R: HandleRole> NativeHandle<R> {
    /// Wraps a raw pointer received from the native module.
    pub const fn from_raw(raw: *mut c_void) -> Self {
        Self {
            raw,
            _role: PhantomData,
        }
    }

    /// The invalid handle.
    pub const fn null() -> Self {
        Self::from_raw(ptr::null_mut())
    }

    /// Returns the raw pointer for passing back across the boundary.
    pub const fn as_raw(self) -> *mut c_void {
        self.raw
    }

    pub fn is_valid(self) -> bool {
        !self.raw.is_null()
    }

    /// Returns the handle if it is non-null, `InvalidHandle` otherwise.
    pub fn validate(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(BindingError::InvalidHandle { role: R::NAME })
        }
    }
}

// Derives would put the bounds on `R`, which is uninhabited.
impl<R: HandleRole> Clone for NativeHandle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: HandleRole> Copy for NativeHandle<R> {}

impl<R: HandleRole> PartialEq for NativeHandle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<R: HandleRole> Eq for NativeHandle<R> {}

impl<R: HandleRole> fmt::Debug for NativeHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle<{}>({:p})", R::NAME, self.raw)
    }
}

// SAFETY: a handle is an address token that Rust never dereferences.
// Thread-safety of the object behind it is the native module's contract.
unsafe impl<R: HandleRole> Send for NativeHandle<R> {}
unsafe impl<R: HandleRole> Sync for NativeHandle<R> {}

//=== AtomicHandle ========================================================

/// Owning cell for a handle that must be released exactly once.
///
/// [`AtomicHandle::take`] swaps the stored handle for null, so only one
/// caller (across all threads) ever receives the live value for release.
pub struct AtomicHandle<R: HandleRole> {
    raw: AtomicPtr<c_void>,
    _role: PhantomData<R>,
}

impl<R: HandleRole> AtomicHandle<R> {
    pub fn new(handle: NativeHandle<R>) -> Self {
        Self {
            raw: AtomicPtr::new(handle.as_raw()),
            _role: PhantomData,
        }
    }

    /// Current handle; null once taken.
    pub fn load(&self) -> NativeHandle<R> {
        NativeHandle::from_raw(self.raw.load(Ordering::Acquire))
    }

    /// Clears the cell, returning the live handle to the first caller only.
    pub fn take(&self) -> Option<NativeHandle<R>> {
        let previous = self.raw.swap(ptr::null_mut(), Ordering::AcqRel);
        let handle = NativeHandle::from_raw(previous);
        handle.is_valid().then_some(handle)
    }

    pub fn is_released(&self) -> bool {
        !self.load().is_valid()
    }
}

impl<R: HandleRole> fmt::Debug for AtomicHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicHandle").field(&self.load()).finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
