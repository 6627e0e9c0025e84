//! The noise app: persisted profile plus the (at most one) running session.

use thiserror::Error;

use crate::config::{DEFAULT_SENSITIVITY, VariantConfig};
use crate::mood::Mood;
use crate::persist::KeyValueStore;
use crate::profile::Profile;
use crate::registry::{CharacterRegistry, RegistryError};
use crate::session::{Session, SessionEvent};

/// Outcome of asking the browser for the microphone.
#[derive(Debug)]
pub enum MicAccess<H> {
    Granted(H),
    Denied,
    Unavailable,
}

impl<H> MicAccess<H> {
    /// The handle, if access was granted.
    pub fn granted(self) -> Option<H> {
        match self {
            MicAccess::Granted(h) => Some(h),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MicError {
    #[error("microphone permission denied")]
    Denied,

    #[error("no microphone available")]
    Unavailable,

    #[error("a session is already running")]
    AlreadyRunning,
}

/// A start that did not go through. A granted handle comes back so the
/// caller can release it.
#[derive(Debug, PartialEq, Eq)]
pub struct StartRefused<H> {
    pub error: MicError,
    pub handle: Option<H>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Running,
}

pub struct NoiseApp<S: KeyValueStore> {
    config: VariantConfig,
    profile: Profile<S>,
    session: Option<Session>,
    sensitivity: u8,
    message: String,
}

impl<S: KeyValueStore> NoiseApp<S> {
    pub fn new(config: VariantConfig, store: S) -> Result<Self, RegistryError> {
        let registry = CharacterRegistry::new(config.catalog())?;
        let profile = Profile::load(registry, store);
        let message = config.messages.idle.clone();
        Ok(Self {
            config,
            profile,
            session: None,
            sensitivity: DEFAULT_SENSITIVITY,
            message,
        })
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    pub fn profile(&self) -> &Profile<S> {
        &self.profile
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn status(&self) -> AppStatus {
        match &self.session {
            Some(s) if s.is_running() => AppStatus::Running,
            _ => AppStatus::Idle,
        }
    }

    pub fn mood(&self) -> Mood {
        self.session.as_ref().map_or(Mood::Sleep, Session::mood)
    }

    /// Current info-line text.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    pub fn threshold(&self) -> f64 {
        self.config.curve.threshold(self.sensitivity)
    }

    pub fn set_sensitivity(&mut self, sensitivity: u8) {
        self.sensitivity = sensitivity.min(100);
        let threshold = self.threshold();
        if let Some(s) = self.session.as_mut() {
            s.set_threshold(threshold);
        }
    }

    /// Consume the microphone acquisition result. Only a granted handle moves
    /// the app to Running; anything else leaves it Idle with a message.
    pub fn begin<H>(&mut self, access: MicAccess<H>, now: f64) -> Result<H, StartRefused<H>> {
        let handle = match access {
            MicAccess::Granted(h) => h,
            MicAccess::Denied => return Err(self.refuse(MicError::Denied)),
            MicAccess::Unavailable => return Err(self.refuse(MicError::Unavailable)),
        };
        if self.status() == AppStatus::Running {
            log::warn!("session already running, handing back the extra microphone");
            return Err(StartRefused {
                error: MicError::AlreadyRunning,
                handle: Some(handle),
            });
        }
        self.session = Some(Session::start(&self.config, self.threshold(), now));
        self.message = self.config.messages.running.clone();
        Ok(handle)
    }

    fn refuse<H>(&mut self, error: MicError) -> StartRefused<H> {
        log::error!("cannot start session: {error}");
        if self.status() == AppStatus::Idle {
            self.message = self.config.messages.mic_denied.clone();
        }
        StartRefused {
            error,
            handle: None,
        }
    }

    /// One animation frame. Earned stars are banked (and saved) before the
    /// events are handed back for rendering.
    pub fn frame(&mut self, amplitude: f64, now: f64) -> Vec<SessionEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let events = session.tick(amplitude, now);
        for e in &events {
            match e {
                SessionEvent::CurrencyEarned { amount } => {
                    self.profile.earn(*amount);
                }
                SessionEvent::MoodChanged { mood } => {
                    self.message = self.config.messages.for_mood(*mood).to_string();
                }
                SessionEvent::MilestoneReached { .. } => {}
            }
        }
        events
    }

    pub fn stop(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.stop();
        }
        self.message = self.config.messages.idle.clone();
    }

    pub fn unlock(&mut self, id: &str) -> Result<u32, RegistryError> {
        self.profile.purchase(id)
    }

    pub fn select(&mut self, id: &str) -> Result<(), RegistryError> {
        self.profile.select(id)
    }
}
