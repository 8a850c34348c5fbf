//=========================================================================
// Stub Engine (tests only)
//=========================================================================
//
// In-process conformance double for `NativeEngine`.
//
// Follows the native module's conventions: fake non-null addresses for
// live objects, null for failure or "no event", and a single registered
// callback that can be fired on demand from any thread. The lock is
// never held while the callback runs, so subscribers may poll freely.
//
// The engine callback carries no user data, so delivery goes through a
// process-wide dispatcher registry. Tests that attach input systems take
// `serial()` so a parallel test never sees another test's events.
//
//=========================================================================

use std::collections::{HashMap, VecDeque};
use std::ffi::{c_void, CStr};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{EventCallbackFn, EventHandle, GameHandle, InputSystemHandle, NativeEngine};

pub(crate) const GAME_ADDR: usize = 0x1000;
pub(crate) const INPUT_ADDR: usize = 0x2000;
const EVENT_BASE_ADDR: usize = 0x10_000;

static SERIAL: Mutex<()> = Mutex::new(());

/// Serializes tests that route events through the engine callback.
pub(crate) fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct StubState {
    create_returns_null: bool,
    input_returns_null: bool,
    titles: Vec<String>,
    destroyed: Vec<usize>,
    run_calls: usize,
    input_requests: usize,
    pending: VecDeque<i32>,
    pushed_on_run: Vec<i32>,
    records: HashMap<usize, i32>,
    next_record: usize,
    callback: Option<EventCallbackFn>,
    registrations: usize,
}

#[derive(Default)]
pub(crate) struct StubEngine {
    state: Mutex<StubState>,
}

impl StubEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Engine whose `create_game` returns null.
    pub(crate) fn failing_create() -> Self {
        let stub = Self::new();
        stub.state.lock().unwrap().create_returns_null = true;
        stub
    }

    /// Engine whose input subsystem accessor returns null.
    pub(crate) fn failing_input_system() -> Self {
        let stub = Self::new();
        stub.state.lock().unwrap().input_returns_null = true;
        stub
    }

    //--- Scripting --------------------------------------------------------

    /// Queues an event for `poll_event`.
    pub(crate) fn queue_event(&self, raw: i32) {
        self.state.lock().unwrap().pending.push_back(raw);
    }

    /// Events pushed through the callback while `run_game` is blocking.
    pub(crate) fn push_during_run(&self, raw: &[i32]) {
        self.state.lock().unwrap().pushed_on_run.extend_from_slice(raw);
    }

    /// Invokes the registered callback as the native side would.
    /// Returns `false` if nothing is registered.
    pub(crate) fn fire(&self, raw: i32) -> bool {
        let registered = self.state.lock().unwrap().callback;
        match registered {
            Some(callback) => {
                // SAFETY: `raw` outlives the call, as the engine guarantees
                // for its own event records.
                unsafe { callback(&raw) };
                true
            }
            None => false,
        }
    }

    /// Invokes the registered callback with a null event pointer.
    pub(crate) fn fire_null(&self) {
        let registered = self.state.lock().unwrap().callback;
        if let Some(callback) = registered {
            // SAFETY: a well-behaved trampoline must reject the null pointer.
            unsafe { callback(std::ptr::null()) };
        }
    }

    //--- Inspection -------------------------------------------------------

    pub(crate) fn titles(&self) -> Vec<String> {
        self.state.lock().unwrap().titles.clone()
    }

    pub(crate) fn destroyed(&self) -> Vec<usize> {
        self.state.lock().unwrap().destroyed.clone()
    }

    pub(crate) fn run_calls(&self) -> usize {
        self.state.lock().unwrap().run_calls
    }

    pub(crate) fn input_requests(&self) -> usize {
        self.state.lock().unwrap().input_requests
    }

    pub(crate) fn registrations(&self) -> usize {
        self.state.lock().unwrap().registrations
    }
}

impl NativeEngine for StubEngine {
    fn create_game(&self, window_title: &CStr) -> GameHandle {
        let mut state = self.state.lock().unwrap();
        state.titles.push(window_title.to_string_lossy().into_owned());
        if state.create_returns_null {
            GameHandle::null()
        } else {
            GameHandle::from_raw(GAME_ADDR as *mut c_void)
        }
    }

    fn destroy_game(&self, game: GameHandle) {
        self.state.lock().unwrap().destroyed.push(game.as_raw() as usize);
    }

    fn run_game(&self, _game: GameHandle) {
        let pushed = {
            let mut state = self.state.lock().unwrap();
            state.run_calls += 1;
            std::mem::take(&mut state.pushed_on_run)
        };
        for raw in pushed {
            self.fire(raw);
        }
    }

    fn game_input_system(&self, _game: GameHandle) -> InputSystemHandle {
        let mut state = self.state.lock().unwrap();
        state.input_requests += 1;
        if state.input_returns_null {
            InputSystemHandle::null()
        } else {
            InputSystemHandle::from_raw(INPUT_ADDR as *mut c_void)
        }
    }

    fn poll_event(&self, _input: InputSystemHandle) -> EventHandle {
        let mut state = self.state.lock().unwrap();
        match state.pending.pop_front() {
            Some(raw) => {
                let addr = EVENT_BASE_ADDR + state.next_record * 0x10;
                state.next_record += 1;
                state.records.insert(addr, raw);
                EventHandle::from_raw(addr as *mut c_void)
            }
            None => EventHandle::null(),
        }
    }

    fn register_event_callback(&self, _input: InputSystemHandle, callback: EventCallbackFn) {
        let mut state = self.state.lock().unwrap();
        state.callback = Some(callback);
        state.registrations += 1;
    }

    fn event_type(&self, event: EventHandle) -> i32 {
        let state = self.state.lock().unwrap();
        state.records.get(&(event.as_raw() as usize)).copied().unwrap_or(-1)
    }
}
