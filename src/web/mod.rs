//! Browser glue: wasm-bindgen exports, microphone, localStorage and the
//! requestAnimationFrame loop driving the noise app.
//!
//! The host page owns all DOM work. It registers a callback with `onEvent`
//! and receives each session event as a JSON string
//! (`{"type":"moodChanged","mood":"angry"}` and friends).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::window;

pub mod audio;
pub mod console;
pub mod games;
pub mod storage;

use crate::app::{AppStatus, MicError, NoiseApp, StartRefused};
use crate::config::VariantConfig;
use crate::sampler::{NoiseSource, meter_percent};
use crate::session::{SessionEvent, format_clock};
use audio::Microphone;
use storage::LocalStorageStore;

pub(crate) fn js_error(err: impl fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

type App = NoiseApp<LocalStorageStore>;

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
    static MIC: RefCell<Option<Microphone>> = RefCell::new(None);
    static LISTENER: RefCell<Option<js_sys::Function>> = RefCell::new(None);
    // bumped per started loop so a stale loop from a stop/start pair exits
    static LOOP_GEN: Cell<u32> = Cell::new(0);
    // bumped by every start/stop request; a mic prompt answered after a newer
    // request is stale
    static START_TICKET: Cell<u32> = Cell::new(0);
    static LIVE_LOOPS: Cell<u32> = Cell::new(0);
}

/// Counts frame-loop closures still allocated; decremented when one is freed.
struct LoopGuard;

impl LoopGuard {
    fn new() -> Self {
        LIVE_LOOPS.with(|n| n.set(n.get() + 1));
        LoopGuard
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        LIVE_LOOPS.with(|n| n.set(n.get().saturating_sub(1)));
    }
}

fn next_ticket() -> u32 {
    START_TICKET.with(|t| {
        t.set(t.get().wrapping_add(1));
        t.get()
    })
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Result<R, JsValue> {
    APP.with(|cell| match cell.borrow_mut().as_mut() {
        Some(app) => Ok(f(app)),
        None => Err(js_error("app not initialised; call initApp first")),
    })
}

fn install(config: VariantConfig) -> Result<(), JsValue> {
    let store = LocalStorageStore::new(config.storage_key.clone());
    let app = NoiseApp::new(config, store).map_err(js_error)?;
    log::info!(
        "{} ready: {} stars, active '{}'",
        app.config().name,
        app.profile().stars(),
        app.profile().active_id()
    );
    APP.with(|cell| cell.replace(Some(app)));
    Ok(())
}

// --- Lifecycle ---------------------------------------------------------------

/// Load the persisted profile for a built-in variant (`"zen"`, `"classic"`).
#[wasm_bindgen(js_name = initApp)]
pub fn init_app(variant: &str) -> Result<(), JsValue> {
    stop_session();
    install(VariantConfig::by_name(variant).map_err(js_error)?)
}

/// Same as `initApp` with a full JSON variant config.
#[wasm_bindgen(js_name = initAppWithConfig)]
pub fn init_app_with_config(json: &str) -> Result<(), JsValue> {
    stop_session();
    install(VariantConfig::from_json(json).map_err(js_error)?)
}

/// Request the microphone and start the session. On refusal the app stays
/// idle and `infoMessage()` explains why.
#[wasm_bindgen(js_name = startSession)]
pub async fn start_session() -> Result<(), JsValue> {
    if with_app(|app| app.status())? == AppStatus::Running {
        return Ok(());
    }
    let ticket = next_ticket();
    let access = audio::acquire().await;
    if START_TICKET.with(Cell::get) != ticket {
        log::info!("start superseded while waiting for the microphone");
        if let Some(mic) = access.granted() {
            mic.release();
        }
        return Ok(());
    }
    let now = crate::performance_now();
    let outcome = APP.with(|cell| match cell.borrow_mut().as_mut() {
        Some(app) => app.begin(access, now),
        None => Err(StartRefused {
            error: MicError::Unavailable,
            handle: access.granted(),
        }),
    });
    match outcome {
        Ok(mic) => {
            MIC.with(|cell| cell.replace(Some(mic)));
            start_frame_loop();
            Ok(())
        }
        Err(refused) => {
            if let Some(mic) = refused.handle {
                mic.release();
            }
            Err(js_error(refused.error))
        }
    }
}

/// Stop sampling, cancel any pending calm-down and release the microphone.
#[wasm_bindgen(js_name = stopSession)]
pub fn stop_session() {
    next_ticket();
    let _ = with_app(|app| app.stop());
    if let Some(mic) = MIC.with(|cell| cell.borrow_mut().take()) {
        mic.release();
    }
}

#[wasm_bindgen(js_name = onEvent)]
pub fn on_event(callback: js_sys::Function) {
    LISTENER.with(|cell| cell.replace(Some(callback)));
}

#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = console::parse_level(level)
        .ok_or_else(|| js_error(format!("unknown log level '{level}'")))?;
    log::set_max_level(filter);
    Ok(())
}

// --- Controls ----------------------------------------------------------------

#[wasm_bindgen(js_name = setSensitivity)]
pub fn set_sensitivity(value: u8) -> Result<(), JsValue> {
    with_app(|app| app.set_sensitivity(value))
}

/// Buy a character; returns the remaining star balance.
#[wasm_bindgen(js_name = unlockCharacter)]
pub fn unlock_character(id: &str) -> Result<u32, JsValue> {
    with_app(|app| app.unlock(id))?.map_err(js_error)
}

#[wasm_bindgen(js_name = selectCharacter)]
pub fn select_character(id: &str) -> Result<(), JsValue> {
    with_app(|app| app.select(id))?.map_err(js_error)
}

// --- Read-outs ---------------------------------------------------------------

#[wasm_bindgen(js_name = starCount)]
pub fn star_count() -> Result<u32, JsValue> {
    with_app(|app| app.profile().stars())
}

#[wasm_bindgen(js_name = activeCharacter)]
pub fn active_character() -> Result<String, JsValue> {
    with_app(|app| app.profile().active_id().to_string())
}

/// Catalog with unlock state, as a JSON array.
#[wasm_bindgen(js_name = characterCatalog)]
pub fn character_catalog() -> Result<String, JsValue> {
    with_app(|app| serde_json::to_string(app.profile().registry().characters()))?.map_err(js_error)
}

#[wasm_bindgen(js_name = currentMood)]
pub fn current_mood() -> Result<String, JsValue> {
    with_app(|app| app.mood().as_str().to_string())
}

#[wasm_bindgen(js_name = infoMessage)]
pub fn info_message() -> Result<String, JsValue> {
    with_app(|app| app.message().to_string())
}

#[wasm_bindgen(js_name = elapsedClock)]
pub fn elapsed_clock() -> Result<String, JsValue> {
    with_app(|app| format_clock(app.session().map_or(0, |s| s.elapsed_secs())))
}

/// Milestone progress bar fill, 0..=1.
#[wasm_bindgen]
pub fn progress() -> Result<f64, JsValue> {
    with_app(|app| app.session().map_or(0.0, |s| s.progress()))
}

/// Noise bar fill in percent.
#[wasm_bindgen(js_name = noiseMeter)]
pub fn noise_meter() -> Result<f64, JsValue> {
    with_app(|app| meter_percent(app.session().map_or(0.0, |s| s.amplitude())))
}

// --- Frame loop --------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_frame_loop() {
    let generation = LOOP_GEN.with(|g| {
        g.set(g.get().wrapping_add(1));
        g.get()
    });
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    let guard = LoopGuard::new();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        let _live = &guard;
        if LOOP_GEN.with(Cell::get) != generation || !frame(ts) {
            // idle: stop rescheduling and break the Rc cycle so the closure is freed
            f.borrow_mut().take();
            return;
        }
        if let Some(w) = window() {
            if let Some(cb) = f.borrow().as_ref() {
                let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
            }
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        if let Some(cb) = g.borrow().as_ref() {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }
}

/// One tick. Returns false once the app is no longer running.
fn frame(now: f64) -> bool {
    let Some(amplitude) = MIC.with(|cell| cell.borrow_mut().as_mut().map(|m| m.amplitude())) else {
        return false;
    };
    let events = APP.with(|cell| match cell.borrow_mut().as_mut() {
        Some(app) if app.status() == AppStatus::Running => Some(app.frame(amplitude, now)),
        _ => None,
    });
    match events {
        Some(events) => {
            dispatch(&events);
            true
        }
        None => false,
    }
}

fn dispatch(events: &[SessionEvent]) {
    if events.is_empty() {
        return;
    }
    // Clone out so the callback may re-enter the exports (e.g. starCount()).
    let Some(cb) = LISTENER.with(|cell| cell.borrow().clone()) else {
        return;
    };
    for e in events {
        match serde_json::to_string(e) {
            Ok(json) => {
                if let Err(err) = cb.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::warn!("event listener threw: {err:?}");
                }
            }
            Err(err) => log::error!("could not encode event: {err}"),
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn live_frame_loops() -> u32 {
        LIVE_LOOPS.with(Cell::get)
    }

    async fn sleep_ms(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            if let Some(w) = window() {
                let _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    #[wasm_bindgen_test]
    async fn test_idle_frame_loop_frees_its_closure() {
        let before = live_frame_loops();
        // No microphone installed, so the first frame finds nothing to run.
        start_frame_loop();
        assert_eq!(live_frame_loops(), before + 1);
        sleep_ms(200).await;
        assert_eq!(live_frame_loops(), before);
    }
}
