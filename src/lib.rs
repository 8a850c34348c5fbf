//=========================================================================
// Forge Game: Library Root
//
// Rust bindings for the Forge native game engine.
//
// The engine lives in a separate shared library; this crate only
// marshals across the boundary:
// - native handles become owned wrappers (`Game`, `InputSystem`, `Event`)
// - native event callbacks become subscriber dispatch
// - handle release happens exactly once, on dispose or drop
//
// Typical usage:
// ```no_run
// use forge_game::{EventType, GameBuilder};
//
// let game = GameBuilder::new().with_title("ForgeGame").build()?;
// game.input_system()?.subscribe(|event| {
//     if event == EventType::KeyPressed {
//         println!("Key pressed");
//     }
// });
// game.run()?;
// # Ok::<(), forge_game::BindingError>(())
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `native` holds the engine operation table and handle types. It is
// public so hosts can plug in their own `NativeEngine` implementation.
//
pub mod native;
pub mod input;
pub mod logging;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------

mod error;
mod game;

//--- Public Exports ------------------------------------------------------

pub use error::{BindingError, Result};
pub use game::{Game, GameBuilder, DEFAULT_WINDOW_TITLE};
pub use input::{Event, EventType, InputSystem, PollEvents, SubscriptionId};
pub use native::{DynamicEngine, NativeEngine};
