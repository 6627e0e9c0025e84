//! Noise sampling: turns analyser frequency bins into a single amplitude per frame.

use crate::mood::MAX_AMPLITUDE;

/// Anything that can hand out one amplitude reading per animation frame.
/// The browser microphone implements this in `web::audio`; tests script it.
pub trait NoiseSource {
    fn amplitude(&mut self) -> f64;
}

/// Mean of the byte frequency bins, 0..=255. Empty input reads as silence.
pub fn mean_amplitude(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u64 = bins.iter().map(|&b| b as u64).sum();
    sum as f64 / bins.len() as f64
}

/// Noise bar fill in percent. Classroom levels sit low on the byte scale, so
/// the reading is amplified 3x for visibility and capped at 100.
pub fn meter_percent(amplitude: f64) -> f64 {
    (amplitude / MAX_AMPLITUDE * 100.0 * 3.0).clamp(0.0, 100.0)
}

/// Replays a fixed list of amplitudes, then silence.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    samples: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        Self {
            samples: samples.into(),
            cursor: 0,
        }
    }
}

impl NoiseSource for ScriptedSource {
    fn amplitude(&mut self) -> f64 {
        let v = self.samples.get(self.cursor).copied().unwrap_or(0.0);
        self.cursor += 1;
        v
    }
}
