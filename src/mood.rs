//! Mood classifier with hysteresis.
//!
//! Every animation frame the sampled amplitude is compared against the
//! sensitivity threshold. Getting louder is applied at once; calming down goes
//! through a cooldown so a single shout keeps the character awake for a few
//! seconds instead of flickering back to sleep on the next frame.

use serde::{Deserialize, Serialize};

// --- Thresholds --------------------------------------------------------------

/// Upper bound of the analyser byte scale.
pub const MAX_AMPLITUDE: f64 = 255.0;
/// Amplitude above `threshold * ANGRY_FACTOR` is Angry rather than Alert.
pub const ANGRY_FACTOR: f64 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Sleep,
    Alert,
    Angry,
}

impl Mood {
    pub fn is_disturbed(self) -> bool {
        !matches!(self, Mood::Sleep)
    }

    /// Asset / purpose key used by the character catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Sleep => "sleep",
            Mood::Alert => "alert",
            Mood::Angry => "angry",
        }
    }
}

/// How a 0..=100 sensitivity slider maps onto a raw amplitude threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdCurve {
    /// `(100 - s) / 100 * 255`: slider 0 never triggers, slider 100 always does.
    #[default]
    Linear,
    /// `(100 - s) * 1.5`, the rocket game's tuning.
    Rocket,
}

impl ThresholdCurve {
    pub fn threshold(self, sensitivity: u8) -> f64 {
        let s = sensitivity.min(100) as f64;
        match self {
            ThresholdCurve::Linear => (100.0 - s) / 100.0 * MAX_AMPLITUDE,
            ThresholdCurve::Rocket => (100.0 - s) * 1.5,
        }
    }
}

pub fn sensitivity_to_threshold(sensitivity: u8) -> f64 {
    ThresholdCurve::Linear.threshold(sensitivity)
}

/// Instantaneous classification, no hysteresis.
pub fn classify(amplitude: f64, threshold: f64) -> Mood {
    if amplitude > threshold * ANGRY_FACTOR {
        Mood::Angry
    } else if amplitude > threshold {
        Mood::Alert
    } else {
        Mood::Sleep
    }
}

// --- Machine -----------------------------------------------------------------

/// Per-mood hold times before a disturbed character may fall back asleep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cooldowns {
    pub alert_ms: f64,
    pub angry_ms: f64,
}

impl Cooldowns {
    fn for_mood(&self, mood: Mood) -> f64 {
        match mood {
            Mood::Angry => self.angry_ms,
            Mood::Alert => self.alert_ms,
            Mood::Sleep => 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MoodMachine {
    threshold: f64,
    cooldowns: Cooldowns,
    mood: Mood,
    mood_since: f64,              // timestamp (ms) of the last applied change
    disturbed_until: Option<f64>, // pending cooldown deadline (ms)
}

impl MoodMachine {
    pub fn new(threshold: f64, cooldowns: Cooldowns, now: f64) -> Self {
        Self {
            threshold,
            cooldowns,
            mood: Mood::Sleep,
            mood_since: now,
            disturbed_until: None,
        }
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn mood_since(&self) -> f64 {
        self.mood_since
    }

    pub fn disturbed_until(&self) -> Option<f64> {
        self.disturbed_until
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Feed one amplitude sample. Returns the new mood when the visible mood
    /// differs from the one at the start of the frame.
    pub fn observe(&mut self, amplitude: f64, now: f64) -> Option<Mood> {
        let before = self.mood;
        self.expire(now);

        let target = classify(amplitude, self.threshold);
        if target.is_disturbed() {
            // Re-escalation always wins over a pending calm-down.
            self.disturbed_until = None;
            if target != self.mood {
                self.apply(target, now);
            }
        } else if self.mood.is_disturbed() && self.disturbed_until.is_none() {
            self.disturbed_until = Some(now + self.cooldowns.for_mood(self.mood));
        }

        (self.mood != before).then_some(self.mood)
    }

    /// Settle a cooldown whose deadline has passed. Returns `Some(Sleep)` when
    /// the character falls asleep.
    pub fn expire(&mut self, now: f64) -> Option<Mood> {
        match self.disturbed_until {
            Some(deadline) if now >= deadline => {
                self.disturbed_until = None;
                self.apply(Mood::Sleep, now);
                Some(Mood::Sleep)
            }
            _ => None,
        }
    }

    /// Drop any pending cooldown without changing the mood.
    pub fn cancel(&mut self) {
        self.disturbed_until = None;
    }

    fn apply(&mut self, mood: Mood, now: f64) {
        log::debug!("mood {} -> {}", self.mood.as_str(), mood.as_str());
        self.mood = mood;
        self.mood_since = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Cooldowns = Cooldowns {
        alert_ms: 4000.0,
        angry_ms: 6000.0,
    };

    #[test]
    fn test_sensitivity_extremes() {
        assert_eq!(sensitivity_to_threshold(0), 255.0);
        assert_eq!(sensitivity_to_threshold(100), 0.0);
        assert_eq!(sensitivity_to_threshold(200), 0.0);
        assert!((sensitivity_to_threshold(50) - 127.5).abs() < 1e-9);
        assert!((ThresholdCurve::Rocket.threshold(50) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(classify(50.0, 50.0), Mood::Sleep);
        assert_eq!(classify(51.0, 50.0), Mood::Alert);
        assert_eq!(classify(75.0, 50.0), Mood::Alert);
        assert_eq!(classify(75.1, 50.0), Mood::Angry);
        // slider 0: nothing on the byte scale can trip it
        assert_eq!(classify(255.0, sensitivity_to_threshold(0)), Mood::Sleep);
        // slider 100: any sound at all is too loud
        assert_eq!(classify(0.5, sensitivity_to_threshold(100)), Mood::Angry);
    }

    #[test]
    fn test_spike_holds_for_cooldown() {
        let mut m = MoodMachine::new(50.0, HOLD, 0.0);
        assert_eq!(m.observe(200.0, 0.0), Some(Mood::Angry));
        assert_eq!(m.observe(0.0, 16.0), None);
        assert_eq!(m.disturbed_until(), Some(6016.0));
        let mut t = 32.0;
        while t < 6016.0 {
            assert_eq!(m.observe(0.0, t), None);
            assert_eq!(m.mood(), Mood::Angry);
            t += 16.0;
        }
        assert_eq!(m.observe(0.0, 6016.0), Some(Mood::Sleep));
        assert_eq!(m.mood_since(), 6016.0);
        assert!(m.disturbed_until().is_none());
    }

    #[test]
    fn test_reescalation_cancels_cooldown() {
        let mut m = MoodMachine::new(50.0, HOLD, 0.0);
        m.observe(60.0, 0.0);
        m.observe(0.0, 100.0);
        assert_eq!(m.disturbed_until(), Some(4100.0));
        assert_eq!(m.observe(60.0, 2000.0), None); // still Alert, but timer dropped
        assert!(m.disturbed_until().is_none());
        m.observe(0.0, 3000.0);
        assert_eq!(m.disturbed_until(), Some(7000.0));
        assert_eq!(m.observe(0.0, 4200.0), None);
        assert_eq!(m.mood(), Mood::Alert);
    }

    #[test]
    fn test_moves_between_alert_and_angry_are_immediate() {
        let mut m = MoodMachine::new(50.0, HOLD, 0.0);
        assert_eq!(m.observe(60.0, 0.0), Some(Mood::Alert));
        assert_eq!(m.observe(100.0, 16.0), Some(Mood::Angry));
        assert_eq!(m.observe(60.0, 32.0), Some(Mood::Alert));
    }

    #[test]
    fn test_cooldown_length_follows_current_mood() {
        let mut m = MoodMachine::new(50.0, HOLD, 0.0);
        m.observe(60.0, 0.0);
        m.observe(0.0, 10.0);
        assert_eq!(m.disturbed_until(), Some(4010.0));
    }

    #[test]
    fn test_cancel_keeps_mood() {
        let mut m = MoodMachine::new(50.0, HOLD, 0.0);
        m.observe(200.0, 0.0);
        m.observe(0.0, 10.0);
        m.cancel();
        assert_eq!(m.expire(100_000.0), None);
        assert_eq!(m.mood(), Mood::Angry);
    }
}
