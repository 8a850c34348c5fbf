//=========================================================================
// Dynamic Engine Library
//=========================================================================
//
// Loads the ForgeEngine shared library at runtime and resolves its C
// entry points once. Function pointers are copied out of the library and
// stay valid for as long as the `Library` value is alive, which is the
// lifetime of `DynamicEngine`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::env;
use std::ffi::{c_char, c_void, CStr};
use std::path::{Path, PathBuf};

use libloading::Library;
use log::{debug, info};

//=== Internal Dependencies ===============================================

use super::{EventCallbackFn, EventHandle, GameHandle, InputSystemHandle, NativeEngine};
use crate::error::{BindingError, Result};

//=== Constants ===========================================================

/// Base name of the engine library (without platform prefix/suffix).
pub const ENGINE_LIBRARY_NAME: &str = "ForgeEngine";

/// Environment variable that overrides the library location.
pub const ENGINE_LIBRARY_ENV: &str = "FORGE_ENGINE_LIB";

//=== EngineApi ===========================================================

type CreateFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type HandleFn = unsafe extern "C" fn(*mut c_void);
type AccessorFn = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
type RegisterFn = unsafe extern "C" fn(*mut c_void, EventCallbackFn);
type EventTypeFn = unsafe extern "C" fn(*mut c_void) -> i32;

/// Resolved entry points.
struct EngineApi {
    game_create: CreateFn,
    game_destroy: HandleFn,
    game_run: HandleFn,
    game_get_inputsystem: AccessorFn,
    inputsystem_pollevent: AccessorFn,
    inputsystem_registercallback: RegisterFn,
    event_geteventtype: EventTypeFn,
}

impl EngineApi {
    /// # Safety
    ///
    /// The library must export these symbols with exactly these signatures.
    unsafe fn resolve(library: &Library) -> Result<Self> {
        Ok(Self {
            game_create: symbol(library, "game_create")?,
            game_destroy: symbol(library, "game_destroy")?,
            game_run: symbol(library, "game_run")?,
            game_get_inputsystem: symbol(library, "game_get_inputsystem")?,
            inputsystem_pollevent: symbol(library, "inputsystem_pollevent")?,
            inputsystem_registercallback: symbol(library, "inputsystem_registercallback")?,
            event_geteventtype: symbol(library, "event_geteventtype")?,
        })
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T> {
    let sym = library
        .get::<T>(name.as_bytes())
        .map_err(|source| BindingError::MissingSymbol { symbol: name, source })?;
    debug!(target: "native", "Resolved entry point `{}`", name);
    Ok(*sym)
}

//=== DynamicEngine =======================================================

/// [`NativeEngine`] backed by a runtime-loaded shared library.
pub struct DynamicEngine {
    api: EngineApi,
    path: PathBuf,
    // Keeps the resolved function pointers valid. `None` only when the
    // entry points are linked into this process.
    _library: Option<Library>,
}

impl DynamicEngine {
    /// Loads the engine from `path` and resolves every entry point.
    ///
    /// Fails with `LibraryLoad` if the library cannot be opened and with
    /// `MissingSymbol` if any entry point is absent. Nothing is retained
    /// on failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // SAFETY: opening runs the library's initialisers; the engine
        // library is trusted to be a well-formed ForgeEngine build.
        let library = unsafe { Library::new(path) }.map_err(|source| BindingError::LibraryLoad {
            path: path.display().to_string(),
            source,
        })?;

        // SAFETY: symbol signatures follow the ForgeEngine C ABI.
        let api = unsafe { EngineApi::resolve(&library)? };

        info!(target: "native", "Loaded native engine from {}", path.display());

        Ok(Self::from_parts(api, path.to_path_buf(), Some(library)))
    }

    fn from_parts(api: EngineApi, path: PathBuf, library: Option<Library>) -> Self {
        Self {
            api,
            path,
            _library: library,
        }
    }

    /// Library location: `$FORGE_ENGINE_LIB`, or the platform file name
    /// for `ForgeEngine` resolved through the system search path.
    pub fn default_library_path() -> PathBuf {
        match env::var_os(ENGINE_LIBRARY_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(libloading::library_filename(ENGINE_LIBRARY_NAME)),
        }
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DynamicEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicEngine").field("path", &self.path).finish()
    }
}

//--- NativeEngine --------------------------------------------------------

impl NativeEngine for DynamicEngine {
    fn create_game(&self, window_title: &CStr) -> GameHandle {
        // SAFETY: `window_title` is NUL-terminated and outlives the call.
        GameHandle::from_raw(unsafe { (self.api.game_create)(window_title.as_ptr()) })
    }

    fn destroy_game(&self, game: GameHandle) {
        // SAFETY: `game` came from `game_create` and is released once.
        unsafe { (self.api.game_destroy)(game.as_raw()) }
    }

    fn run_game(&self, game: GameHandle) {
        // SAFETY: `game` is a live engine handle.
        unsafe { (self.api.game_run)(game.as_raw()) }
    }

    fn game_input_system(&self, game: GameHandle) -> InputSystemHandle {
        // SAFETY: `game` is a live engine handle.
        InputSystemHandle::from_raw(unsafe { (self.api.game_get_inputsystem)(game.as_raw()) })
    }

    fn poll_event(&self, input: InputSystemHandle) -> EventHandle {
        // SAFETY: `input` was returned by `game_get_inputsystem`.
        EventHandle::from_raw(unsafe { (self.api.inputsystem_pollevent)(input.as_raw()) })
    }

    fn register_event_callback(&self, input: InputSystemHandle, callback: EventCallbackFn) {
        // SAFETY: `callback` is a static fn valid for the whole process;
        // see `input::dispatcher`.
        unsafe { (self.api.inputsystem_registercallback)(input.as_raw(), callback) }
    }

    fn event_type(&self, event: EventHandle) -> i32 {
        // SAFETY: `event` was just returned by `inputsystem_pollevent`.
        unsafe { (self.api.event_geteventtype)(event.as_raw()) }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::EventType;
    use crate::native::stub::serial;
    use crate::GameBuilder;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    //--- In-Process Engine ------------------------------------------------
    //
    // C entry points with the ForgeEngine signatures, linked into the test
    // binary. `game_run` pushes queued events the way the engine does: the
    // event type lives on its stack and is passed by reference.

    const GAME_ADDR: usize = 0x1000;
    const INPUT_ADDR: usize = 0x2000;
    const EVENT_BASE_ADDR: usize = 0x10_000;

    struct Fake {
        titles: Vec<String>,
        destroyed: Vec<usize>,
        callback: Option<EventCallbackFn>,
        registered_for: Vec<usize>,
        pending: VecDeque<i32>,
        pushed_on_run: Vec<i32>,
    }

    static FAKE: Mutex<Fake> = Mutex::new(Fake {
        titles: Vec::new(),
        destroyed: Vec::new(),
        callback: None,
        registered_for: Vec::new(),
        pending: VecDeque::new(),
        pushed_on_run: Vec::new(),
    });

    fn fake() -> MutexGuard<'static, Fake> {
        FAKE.lock().unwrap_or_else(PoisonError::into_inner)
    }

    unsafe extern "C" fn fake_game_create(title: *const c_char) -> *mut c_void {
        let title = unsafe { CStr::from_ptr(title) }.to_string_lossy().into_owned();
        fake().titles.push(title);
        GAME_ADDR as *mut c_void
    }

    unsafe extern "C" fn fake_game_destroy(game: *mut c_void) {
        fake().destroyed.push(game as usize);
    }

    unsafe extern "C" fn fake_game_run(_game: *mut c_void) {
        let (callback, pushed) = {
            let mut fake = fake();
            (fake.callback, std::mem::take(&mut fake.pushed_on_run))
        };
        if let Some(callback) = callback {
            for value in pushed {
                let evt: i32 = value;
                unsafe { callback(&evt) };
            }
        }
    }

    unsafe extern "C" fn fake_game_get_inputsystem(_game: *mut c_void) -> *mut c_void {
        INPUT_ADDR as *mut c_void
    }

    unsafe extern "C" fn fake_inputsystem_pollevent(_input: *mut c_void) -> *mut c_void {
        match fake().pending.pop_front() {
            Some(raw) => (EVENT_BASE_ADDR + raw as usize) as *mut c_void,
            None => std::ptr::null_mut(),
        }
    }

    unsafe extern "C" fn fake_inputsystem_registercallback(
        input: *mut c_void,
        callback: EventCallbackFn,
    ) {
        let mut fake = fake();
        fake.callback = Some(callback);
        fake.registered_for.push(input as usize);
    }

    unsafe extern "C" fn fake_event_geteventtype(event: *mut c_void) -> i32 {
        (event as usize - EVENT_BASE_ADDR) as i32
    }

    fn in_process_engine() -> DynamicEngine {
        let api = EngineApi {
            game_create: fake_game_create,
            game_destroy: fake_game_destroy,
            game_run: fake_game_run,
            game_get_inputsystem: fake_game_get_inputsystem,
            inputsystem_pollevent: fake_inputsystem_pollevent,
            inputsystem_registercallback: fake_inputsystem_registercallback,
            event_geteventtype: fake_event_geteventtype,
        };
        DynamicEngine::from_parts(api, PathBuf::from("in-process"), None)
    }

    fn reset_fake() {
        let mut fake = fake();
        fake.titles.clear();
        fake.destroyed.clear();
        fake.callback = None;
        fake.registered_for.clear();
        fake.pending.clear();
        fake.pushed_on_run.clear();
    }

    //=====================================================================
    // Loading Tests
    //=====================================================================

    #[test]
    fn missing_library_reports_load_error() {
        let err = DynamicEngine::load("/nonexistent/dir/libForgeEngine_missing.so").unwrap_err();
        match err {
            BindingError::LibraryLoad { path, .. } => {
                assert!(path.contains("libForgeEngine_missing"), "path should be reported: {path}");
            }
            other => panic!("expected LibraryLoad, got {other:?}"),
        }
    }

    #[test]
    fn default_path_uses_platform_file_name() {
        let path = DynamicEngine::default_library_path();
        if env::var_os(ENGINE_LIBRARY_ENV).map_or(true, |p| p.is_empty()) {
            let name = path.to_string_lossy();
            assert!(name.contains(ENGINE_LIBRARY_NAME), "unexpected default path {name}");
        }
    }

    //=====================================================================
    // Entry Point Tests
    //=====================================================================

    #[test]
    fn entry_points_forward_handles_and_values() {
        let _serial = serial();
        reset_fake();
        let engine = in_process_engine();

        let title = CStr::from_bytes_with_nul(b"Forge\0").unwrap();
        let game = engine.create_game(title);
        assert_eq!(game.as_raw() as usize, GAME_ADDR);
        assert_eq!(fake().titles, vec!["Forge".to_string()]);

        let input = engine.game_input_system(game);
        assert_eq!(input.as_raw() as usize, INPUT_ADDR);

        assert!(!engine.poll_event(input).is_valid(), "empty queue polls as null");
        fake().pending.push_back(EventType::MouseWheelScrolled.to_raw());
        let event = engine.poll_event(input);
        assert!(event.is_valid());
        assert_eq!(engine.event_type(event), EventType::MouseWheelScrolled.to_raw());

        engine.destroy_game(game);
        assert_eq!(fake().destroyed, vec![GAME_ADDR]);
        assert_eq!(engine.path(), Path::new("in-process"));
    }

    #[test]
    fn game_session_round_trips_through_entry_points() {
        let _serial = serial();
        reset_fake();
        let game = GameBuilder::new()
            .with_title("Forge ✓")
            .with_engine(Arc::new(in_process_engine()))
            .build()
            .unwrap();
        assert_eq!(fake().titles, vec!["Forge ✓".to_string()]);

        let input = game.input_system().unwrap();
        assert_eq!(fake().registered_for, vec![INPUT_ADDR], "callback registered once");

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            input.subscribe(move |e| seen.lock().unwrap().push(e));
        }

        // The engine passes a pointer to its own i32 and nothing else.
        fake().pushed_on_run.extend([EventType::KeyPressed.to_raw(), EventType::Closed.to_raw()]);
        game.run().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![EventType::KeyPressed, EventType::Closed]);

        fake().pending.extend([EventType::GainedFocus.to_raw(), EventType::TouchEnded.to_raw()]);
        let polled: Vec<EventType> = input.poll_events().collect::<Result<_>>().unwrap();
        assert_eq!(polled, vec![EventType::GainedFocus, EventType::TouchEnded]);

        game.dispose();
        game.dispose();
        assert_eq!(fake().destroyed, vec![GAME_ADDR], "released exactly once");
    }
}
