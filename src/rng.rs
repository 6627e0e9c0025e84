//! Small randomness seam for the games (question order, asteroid spawns).
//! Not crypto secure and not meant to be.

pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    /// Uniform-ish index in `0..len`; 0 for an empty range.
    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.next_u32() as usize % len
    }

    /// True with probability `p` (clamped to 0..=1).
    fn chance(&mut self, p: f64) -> bool {
        (self.next_u32() as f64 / u32::MAX as f64) < p.clamp(0.0, 1.0)
    }
}

/// Fisher–Yates shuffle in place.
pub fn shuffle<T>(items: &mut [T], rng: &mut impl RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.index(i + 1);
        items.swap(i, j);
    }
}

/// Linear congruential generator (Numerical Recipes constants).
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seeded from `performance.now()`; 0 off-browser.
    pub fn from_clock() -> Self {
        Self::new(crate::performance_now() as u64 as u32)
    }
}

impl RandomSource for Lcg {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        // low bits of an LCG cycle quickly; fold the high half down
        self.state ^ (self.state >> 16)
    }
}

/// Browser crypto randomness via `getrandom`; falls back to a clock LCG if
/// the platform refuses.
#[cfg(feature = "rng")]
pub struct OsRandom {
    fallback: Lcg,
}

#[cfg(feature = "rng")]
impl Default for OsRandom {
    fn default() -> Self {
        Self {
            fallback: Lcg::from_clock(),
        }
    }
}

#[cfg(feature = "rng")]
impl RandomSource for OsRandom {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => u32::from_le_bytes(buf),
            Err(err) => {
                log::warn!("getrandom failed ({err}), using clock LCG");
                self.fallback.next_u32()
            }
        }
    }
}

/// The source the web glue hands to the games.
#[cfg(feature = "rng")]
pub type DefaultSource = OsRandom;
#[cfg(not(feature = "rng"))]
pub type DefaultSource = Lcg;

#[cfg(feature = "rng")]
pub fn default_source() -> DefaultSource {
    OsRandom::default()
}

#[cfg(not(feature = "rng"))]
pub fn default_source() -> DefaultSource {
    Lcg::from_clock()
}
