//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use forge_game::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Game lifecycle
pub use crate::game::{Game, GameBuilder};

// Input
pub use crate::input::{Event, EventType, InputSystem, SubscriptionId};

// Native boundary
pub use crate::native::{DynamicEngine, NativeEngine};

// Errors and logging
pub use crate::error::{BindingError, Result};
pub use crate::logging::{init_logging, LoggingConfig};
