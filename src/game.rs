//=========================================================================
// Forge Game
//
// Owner of the native engine instance.
//
// Architecture:
// ```text
//     GameBuilder  ──build()──>  Game  ──run()──>  [native loop]
//         │                        │
//         ├─ with_title()          ├─ input_system()  (created once, cached)
//         ├─ with_library()        └─ dispose() / Drop (releases once)
//         └─ with_engine()
// ```
//
// Teardown order: the cached input system is detached and released first,
// then the engine handle is destroyed. Detaching covers callers that still
// hold their own `Arc<InputSystem>`. Release goes through an atomic exchange,
// so it happens exactly once no matter how many threads dispose.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::ffi::CString;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info};

//=== Internal Dependencies ===============================================

use crate::error::{BindingError, Result};
use crate::input::InputSystem;
use crate::native::{AtomicHandle, DynamicEngine, GameHandle, GameRole, NativeEngine};

//=== Constants ===========================================================

/// Window title used when none is configured.
pub const DEFAULT_WINDOW_TITLE: &str = "ForgeGame";

//=== GameBuilder =========================================================

/// Builder for configuring and constructing a [`Game`].
///
/// # Default Values
///
/// - **Title**: `"ForgeGame"`
/// - **Library**: `$FORGE_ENGINE_LIB`, or the platform file name for
///   `ForgeEngine` (e.g. `libForgeEngine.so`, `ForgeEngine.dll`)
///
/// # Examples
///
/// ```no_run
/// use forge_game::GameBuilder;
///
/// let game = GameBuilder::new()
///     .with_title("Sandbox")
///     .with_library("./target/native/libForgeEngine.so")
///     .build()?;
/// game.run()?;
/// # Ok::<(), forge_game::BindingError>(())
/// ```
pub struct GameBuilder {
    title: String,
    library: Option<PathBuf>,
    engine: Option<Arc<dyn NativeEngine>>,
}

impl GameBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            title: DEFAULT_WINDOW_TITLE.to_owned(),
            library: None,
            engine: None,
        }
    }

    /// Sets the window title passed to the engine.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Loads the engine from this shared library path.
    ///
    /// Ignored when an engine is supplied with [`GameBuilder::with_engine`].
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = Some(path.into());
        self
    }

    /// Uses an already-constructed engine instead of loading a library.
    pub fn with_engine(mut self, engine: Arc<dyn NativeEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Loads the engine (if needed) and creates the game instance.
    pub fn build(self) -> Result<Game> {
        let engine = match self.engine {
            Some(engine) => engine,
            None => {
                let path = self.library.unwrap_or_else(DynamicEngine::default_library_path);
                Arc::new(DynamicEngine::load(path)?)
            }
        };

        Game::create(engine, &self.title)
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Game ================================================================

/// A running (or runnable) engine instance.
///
/// `Game` exclusively owns its native handle. The handle is released by
/// [`Game::dispose`] or, as a backstop, when the value is dropped; after
/// that every operation fails with `InvalidState`.
pub struct Game {
    engine: Arc<dyn NativeEngine>,
    handle: Arc<AtomicHandle<GameRole>>,
    input_system: Mutex<Option<Arc<InputSystem>>>,
}

impl Game {
    //--- Construction -----------------------------------------------------

    /// Creates a game with a window titled `window_title`.
    ///
    /// Fails with `EngineInitFailed` if the engine returns a null handle,
    /// and with `InvalidTitle` if the title contains a NUL byte.
    pub fn create(engine: Arc<dyn NativeEngine>, window_title: &str) -> Result<Self> {
        let title = CString::new(window_title)?;

        let handle = engine.create_game(&title);
        if !handle.is_valid() {
            error!(target: "game", "Native engine refused to create \"{}\"", window_title);
            return Err(BindingError::EngineInitFailed { what: "game instance" });
        }

        info!(target: "game", "Created game \"{}\" ({:?})", window_title, handle);

        Ok(Self {
            engine,
            handle: Arc::new(AtomicHandle::new(handle)),
            input_system: Mutex::new(None),
        })
    }

    /// Shorthand for [`GameBuilder::new`].
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    //--- Execution --------------------------------------------------------

    /// Runs the engine loop and blocks until it exits.
    ///
    /// Events are delivered to [`InputSystem`] subscribers while this call
    /// is blocking, possibly from other threads.
    pub fn run(&self) -> Result<()> {
        let handle = self.live_handle()?;

        info!(target: "game", "Entering native engine loop");
        self.engine.run_game(handle);
        info!(target: "game", "Native engine loop exited");

        Ok(())
    }

    //--- Input ------------------------------------------------------------

    /// Returns the game's input system, creating it on first use.
    ///
    /// Every call on the same game returns the same instance.
    pub fn input_system(&self) -> Result<Arc<InputSystem>> {
        // Checked under the lock: dispose waits on it before destroying.
        let mut cached = self.input_system.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = self.live_handle()?;

        if let Some(input) = cached.as_ref() {
            return Ok(Arc::clone(input));
        }

        let native = self.engine.game_input_system(handle);
        if !native.is_valid() {
            error!(target: "game", "Native engine has no input system");
            return Err(BindingError::EngineInitFailed { what: "input system" });
        }

        let input = Arc::new(InputSystem::new(
            Arc::clone(&self.engine),
            native,
            Arc::clone(&self.handle),
        )?);
        *cached = Some(Arc::clone(&input));

        Ok(input)
    }

    //--- Teardown ---------------------------------------------------------

    /// Releases the native engine instance.
    ///
    /// Only the first call (from any thread) reaches the engine; later
    /// calls are no-ops.
    pub fn dispose(&self) {
        let Some(handle) = self.handle.take() else {
            debug!(target: "game", "Dispose on released game ignored");
            return;
        };

        let input = self
            .input_system
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(input) = input {
            input.detach();
        }

        self.engine.destroy_game(handle);
        info!(target: "game", "Released native game {:?}", handle);
    }

    /// Whether the native handle has been released.
    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }

    /// Current native handle; null once disposed.
    pub fn handle(&self) -> GameHandle {
        self.handle.load()
    }

    fn live_handle(&self) -> Result<GameHandle> {
        self.handle
            .load()
            .validate()
            .map_err(|_| BindingError::InvalidState { what: "game" })
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game").field("handle", &self.handle.load()).finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
