//=========================================================================
// Binding Errors
//=========================================================================
//
// Error taxonomy for the native/Rust boundary.
//
// Every failure here is terminal for the call that produced it: nothing
// is retried and no default is substituted. Callers should treat them as
// environment problems (missing or incompatible native module).
//
//=========================================================================

//=== External Dependencies ===============================================

use std::ffi::NulError;

use thiserror::Error;

//=== BindingError ========================================================

/// Errors produced by the binding layer.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A handle that must be non-null was null.
    #[error("native handle for {role} is null")]
    InvalidHandle { role: &'static str },

    /// A native factory or accessor returned null.
    #[error("native engine failed to provide {what}")]
    EngineInitFailed { what: &'static str },

    /// Operation attempted on an owner whose native handle is released.
    #[error("{what} used after the native game was released")]
    InvalidState { what: &'static str },

    /// The native side reported an event type outside the known encoding.
    #[error("native event type {0} is not a known event")]
    UnknownEventType(i32),

    /// The window title cannot be passed as a C string.
    #[error("window title contains an interior NUL byte")]
    InvalidTitle(#[from] NulError),

    /// The native engine library could not be loaded.
    #[error("failed to load native engine library `{path}`")]
    LibraryLoad {
        path: String,
        #[source]
        source: libloading::Error,
    },

    /// A required entry point is missing from the native library.
    #[error("native engine library is missing entry point `{symbol}`")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BindingError>;

//=========================================================================
// Unit Tests
//=========================================================================
