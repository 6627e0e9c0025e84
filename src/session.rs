//! One running noise-monitoring session: the explicit context every frame
//! update works on.

use serde::Serialize;

use crate::config::VariantConfig;
use crate::economy::{MilestoneTrack, QuietRewards};
use crate::mood::{Mood, MoodMachine, classify};

/// What the renderer hears about. Serialized as `{"type": "...", ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    MoodChanged { mood: Mood },
    CurrencyEarned { amount: u32 },
    MilestoneReached { id: String },
}

pub struct Session {
    machine: MoodMachine,
    rewards: Option<QuietRewards>,
    milestones: MilestoneTrack,
    restart_clock_on_noise: bool,
    amplitude: f64,
    started_ms: f64,
    clock_start_ms: f64, // quiet clock; equals started_ms unless noise restarts it
    elapsed_secs: u64,
    running: bool,
}

impl Session {
    pub fn start(config: &VariantConfig, threshold: f64, now: f64) -> Self {
        log::info!("session '{}' started (threshold {threshold:.1})", config.name);
        Self {
            machine: MoodMachine::new(threshold, config.cooldowns(), now),
            rewards: config.frames_per_star.map(QuietRewards::new),
            milestones: MilestoneTrack::new(&config.milestones),
            restart_clock_on_noise: config.restart_clock_on_noise,
            amplitude: 0.0,
            started_ms: now,
            clock_start_ms: now,
            elapsed_secs: 0,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mood(&self) -> Mood {
        self.machine.mood()
    }

    pub fn mood_since(&self) -> f64 {
        self.machine.mood_since()
    }

    pub fn disturbed_until(&self) -> Option<f64> {
        self.machine.disturbed_until()
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn threshold(&self) -> f64 {
        self.machine.threshold()
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.machine.set_threshold(threshold);
    }

    pub fn quiet_streak_frames(&self) -> u32 {
        self.rewards.as_ref().map_or(0, QuietRewards::streak)
    }

    /// Seconds on the quiet clock as of the last frame.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn started_ms(&self) -> f64 {
        self.started_ms
    }

    pub fn progress(&self) -> f64 {
        self.milestones.progress(self.elapsed_secs)
    }

    pub fn milestones(&self) -> &MilestoneTrack {
        &self.milestones
    }

    /// Run one animation frame: classify, advance the clock, pay out.
    pub fn tick(&mut self, amplitude: f64, now: f64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }
        self.amplitude = amplitude;

        if let Some(mood) = self.machine.observe(amplitude, now) {
            events.push(SessionEvent::MoodChanged { mood });
        }

        if self.restart_clock_on_noise && classify(amplitude, self.machine.threshold()).is_disturbed() {
            self.clock_start_ms = now;
        }
        self.elapsed_secs = ((now - self.clock_start_ms).max(0.0) / 1000.0).floor() as u64;

        for id in self.milestones.evaluate(self.elapsed_secs) {
            log::info!("milestone reached: {id}");
            events.push(SessionEvent::MilestoneReached { id });
        }

        if let Some(rewards) = self.rewards.as_mut() {
            let amount = rewards.on_frame(self.machine.mood());
            if amount > 0 {
                events.push(SessionEvent::CurrencyEarned { amount });
            }
        }
        events
    }

    /// Halt sampling and drop any pending calm-down.
    pub fn stop(&mut self) {
        if self.running {
            log::info!("session stopped after {}s", self.elapsed_secs);
        }
        self.running = false;
        self.machine.cancel();
    }
}

/// `HH:MM:SS` for the on-screen timer.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
