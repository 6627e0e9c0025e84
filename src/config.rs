//! Per-variant tuning. The built-in variants cover the shipped apps; a host
//! page may pass its own JSON to `VariantConfig::from_json`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::economy::{DEFAULT_FRAMES_PER_STAR, MilestoneDef};
use crate::mood::{Cooldowns, Mood, ThresholdCurve};
use crate::registry::{CLASSIC_CHARACTERS, Character, ZEN_CHARACTERS};

/// Slider position used until the page reports one; close to the raw
/// threshold of 50 the apps started from.
pub const DEFAULT_SENSITIVITY: u8 = 80;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid variant config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid variant config: {0}")]
    Invalid(String),

    #[error("unknown variant '{0}'")]
    UnknownVariant(String),
}

/// Text shown in the info line for each phase of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Messages {
    pub idle: String,
    pub running: String,
    pub sleep: String,
    pub alert: String,
    pub angry: String,
    pub mic_denied: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            idle: "Click anywhere to start.".into(),
            running: "Keep it quiet to earn stars!".into(),
            sleep: "Earning stars...".into(),
            alert: "Shh...".into(),
            angry: "TOO LOUD!".into(),
            mic_denied: "Microphone access is needed to play.".into(),
        }
    }
}

impl Messages {
    pub fn for_mood(&self, mood: Mood) -> &str {
        match mood {
            Mood::Sleep => &self.sleep,
            Mood::Alert => &self.alert,
            Mood::Angry => &self.angry,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariantConfig {
    pub name: String,
    pub curve: ThresholdCurve,
    pub alert_cooldown_ms: f64,
    pub angry_cooldown_ms: f64,
    /// `None` disables star rewards.
    pub frames_per_star: Option<u32>,
    pub milestones: Vec<MilestoneDef>,
    /// Loud samples restart the quiet clock the milestones are measured on.
    pub restart_clock_on_noise: bool,
    pub storage_key: String,
    pub messages: Messages,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self::zen()
    }
}

impl VariantConfig {
    /// Multi-character app: stars for quiet streaks, 3 s calm-down.
    pub fn zen() -> Self {
        Self {
            name: "zen".into(),
            curve: ThresholdCurve::Linear,
            alert_cooldown_ms: 3000.0,
            angry_cooldown_ms: 3000.0,
            frames_per_star: Some(DEFAULT_FRAMES_PER_STAR),
            milestones: Vec::new(),
            restart_clock_on_noise: false,
            storage_key: "zenGuardiansData".into(),
            messages: Messages::default(),
        }
    }

    /// Single fat cat: milestones on an uninterrupted quiet clock.
    pub fn classic() -> Self {
        Self {
            name: "classic".into(),
            curve: ThresholdCurve::Linear,
            alert_cooldown_ms: 4000.0,
            angry_cooldown_ms: 6000.0,
            frames_per_star: None,
            milestones: vec![
                MilestoneDef::new("pillow", 60),
                MilestoneDef::new("sunbeam", 300),
                MilestoneDef::new("yarn", 600),
                MilestoneDef::new("aura", 1200),
            ],
            restart_clock_on_noise: true,
            storage_key: "zenGingerCatData".into(),
            messages: Messages {
                idle: "Click anywhere to start.".into(),
                running: "Shh... the fat cat is dreaming.".into(),
                sleep: "Shh... the fat cat is dreaming.".into(),
                alert: "Really? Do you have to be so loud?".into(),
                angry: "NOW YOU'VE DONE IT! HE'S ANGRY!".into(),
                mic_denied: "Please enable microphone access to start.".into(),
            },
        }
    }

    pub fn by_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "zen" => Ok(Self::zen()),
            "classic" => Ok(Self::classic()),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_per_star == Some(0) {
            return Err(ConfigError::Invalid("framesPerStar must be at least 1".into()));
        }
        if !(self.alert_cooldown_ms >= 0.0 && self.angry_cooldown_ms >= 0.0) {
            return Err(ConfigError::Invalid("cooldowns must be non-negative".into()));
        }
        for (i, m) in self.milestones.iter().enumerate() {
            if self.milestones[..i].iter().any(|prev| prev.id == m.id) {
                return Err(ConfigError::Invalid(format!("duplicate milestone '{}'", m.id)));
            }
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::Invalid("storageKey must not be empty".into()));
        }
        Ok(())
    }

    pub fn cooldowns(&self) -> Cooldowns {
        Cooldowns {
            alert_ms: self.alert_cooldown_ms,
            angry_ms: self.angry_cooldown_ms,
        }
    }

    pub fn catalog(&self) -> &'static [Character] {
        match self.name.as_str() {
            "classic" => CLASSIC_CHARACTERS,
            _ => ZEN_CHARACTERS,
        }
    }
}
