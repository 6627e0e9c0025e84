//! Rewards for sustained calm: a per-frame quiet streak that pays out stars,
//! and a time-based milestone track.

use serde::{Deserialize, Serialize};

use crate::mood::Mood;

/// ~10 s of sleep at 60 fps.
pub const DEFAULT_FRAMES_PER_STAR: u32 = 600;

// --- Continuous reward -------------------------------------------------------

#[derive(Clone, Debug)]
pub struct QuietRewards {
    frames_per_reward: u32,
    streak: u32, // consecutive Sleep frames
}

impl QuietRewards {
    /// `frames_per_reward` of zero is treated as one.
    pub fn new(frames_per_reward: u32) -> Self {
        Self {
            frames_per_reward: frames_per_reward.max(1),
            streak: 0,
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Count one frame at the given mood; returns the currency granted on
    /// this frame (0 or 1). Any non-Sleep frame forfeits the partial streak.
    pub fn on_frame(&mut self, mood: Mood) -> u32 {
        if mood.is_disturbed() {
            self.streak = 0;
            return 0;
        }
        self.streak = self.streak.saturating_add(1);
        u32::from(self.streak % self.frames_per_reward == 0)
    }

    pub fn reset(&mut self) {
        self.streak = 0;
    }
}

// --- Milestones --------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneDef {
    pub id: String,
    pub seconds: u64,
}

impl MilestoneDef {
    pub fn new(id: impl Into<String>, seconds: u64) -> Self {
        Self {
            id: id.into(),
            seconds,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Milestone {
    pub id: String,
    pub threshold_secs: u64,
    pub reached: bool,
}

/// Ascending list of one-shot milestones for a single session.
#[derive(Clone, Debug, Default)]
pub struct MilestoneTrack {
    milestones: Vec<Milestone>,
}

impl MilestoneTrack {
    pub fn new<'a>(defs: impl IntoIterator<Item = &'a MilestoneDef>) -> Self {
        let mut milestones: Vec<Milestone> = defs
            .into_iter()
            .map(|d| Milestone {
                id: d.id.clone(),
                threshold_secs: d.seconds,
                reached: false,
            })
            .collect();
        // stable: equal thresholds keep their declared order
        milestones.sort_by_key(|m| m.threshold_secs);
        Self { milestones }
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Ids of every milestone newly reached at `elapsed_secs`, in ascending
    /// threshold order. Each id is returned at most once per session.
    pub fn evaluate(&mut self, elapsed_secs: u64) -> Vec<String> {
        let mut fired = Vec::new();
        for m in &mut self.milestones {
            if m.threshold_secs > elapsed_secs {
                break;
            }
            if !m.reached {
                m.reached = true;
                fired.push(m.id.clone());
            }
        }
        fired
    }

    /// Fraction of the track covered, for the progress bar.
    pub fn progress(&self, elapsed_secs: u64) -> f64 {
        match self.milestones.last() {
            Some(last) if last.threshold_secs > 0 => {
                (elapsed_secs as f64 / last.threshold_secs as f64).min(1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    pub fn reset(&mut self) {
        for m in &mut self.milestones {
            m.reached = false;
        }
    }
}
