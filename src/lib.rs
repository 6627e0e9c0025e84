//! Zen Guardians core crate.
//!
//! A classroom noise monitor: the microphone level drives a guardian's mood
//! (sleep / alert / angry), quiet time earns stars, and stars unlock more
//! guardians. Everything outside `web` is plain Rust and runs natively under
//! `cargo test`; `web` wires it to the browser (Web Audio, localStorage,
//! requestAnimationFrame) and exports the JS API.
//!
//! Two extra classroom pages live alongside: a voice-driven rocket game and a
//! two-team math race.

use wasm_bindgen::prelude::*;

pub mod app;
pub mod config;
pub mod economy;
pub mod mood;
pub mod persist;
pub mod profile;
pub mod race;
pub mod registry;
pub mod rng;
pub mod rocket;
pub mod sampler;
pub mod session;
pub mod web;

pub use app::{AppStatus, MicAccess, MicError, NoiseApp, StartRefused};
pub use config::{ConfigError, VariantConfig};
pub use mood::{Mood, MoodMachine};
pub use persist::{KeyValueStore, MemoryStore, SaveData};
pub use profile::Profile;
pub use registry::{Character, CharacterRegistry, RegistryError};
pub use session::{Session, SessionEvent};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    web::console::init(log::LevelFilter::Info);
}

/// Milliseconds from the page's performance clock; 0 off-browser.
pub fn performance_now() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0.0
    }
}
