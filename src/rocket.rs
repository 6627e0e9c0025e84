//! Silence-fueled side-scroller. Quiet fills the tank and speeds the rocket
//! up; noise drains fuel and drags it down. Running dry only slows the rocket:
//! there is no game over, the class just has to quiet down to recharge.

use serde::Serialize;

use crate::mood::{ANGRY_FACTOR, ThresholdCurve};
use crate::persist::KeyValueStore;

pub const START_FUEL: f64 = 50.0;
pub const MAX_FUEL: f64 = 100.0;
pub const MAX_SPEED: f64 = 10.0;
pub const LOW_FUEL: f64 = 20.0;
/// Distance between planet discoveries.
pub const PLANET_SPACING: f64 = 5000.0;

const FUEL_GAIN: f64 = 0.1;
const FUEL_DRAIN: f64 = 0.3;
const THRUST: f64 = 0.1;
const DRAG: f64 = 0.2;
const DRIFT: f64 = 0.1; // extra slow-down with an empty tank
const HIT_FUEL_COST: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RocketPhase {
    Ready,
    Playing,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RocketEvent {
    /// Quiet frame: engine burning, renderer may puff exhaust.
    Thrust,
    /// Loud frame; `turbulent` when loud enough to shake the screen.
    Drag { turbulent: bool },
    FuelEmpty,
    PlanetDiscovered { count: u32 },
    AsteroidHit { fuel: f64 },
}

pub struct RocketSession<S: KeyValueStore> {
    phase: RocketPhase,
    threshold: f64,
    fuel: f64,
    speed: f64,
    distance: f64,
    planets_found: u32,
    was_empty: bool,
    high_score: u64,
    scores: S,
}

impl<S: KeyValueStore> RocketSession<S> {
    /// `scores` holds the best score as a decimal string.
    pub fn new(scores: S, sensitivity: u8) -> Self {
        let high_score = scores
            .load()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Self {
            phase: RocketPhase::Ready,
            threshold: ThresholdCurve::Rocket.threshold(sensitivity),
            fuel: START_FUEL,
            speed: 0.0,
            distance: 0.0,
            planets_found: 0,
            was_empty: false,
            high_score,
            scores,
        }
    }

    pub fn phase(&self) -> RocketPhase {
        self.phase
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn score(&self) -> u64 {
        (self.distance / 10.0).floor() as u64
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn planets_found(&self) -> u32 {
        self.planets_found
    }

    pub fn low_fuel(&self) -> bool {
        self.fuel < LOW_FUEL
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_sensitivity(&mut self, sensitivity: u8) {
        self.threshold = ThresholdCurve::Rocket.threshold(sensitivity);
    }

    /// Start (or restart) a flight. Banks the previous run's score first.
    pub fn reset(&mut self) {
        self.record_high_score();
        self.phase = RocketPhase::Playing;
        self.fuel = START_FUEL;
        self.speed = 0.0;
        self.distance = 0.0;
        self.planets_found = 0;
        self.was_empty = false;
    }

    /// Chance per frame that the renderer spawns an asteroid.
    pub fn spawn_chance(&self) -> f64 {
        0.005 + self.speed / 2000.0
    }

    pub fn tick(&mut self, amplitude: f64) -> Vec<RocketEvent> {
        let mut events = Vec::new();
        if self.phase != RocketPhase::Playing {
            return events;
        }

        // strictly below: a zero threshold drains even in silence
        if amplitude < self.threshold {
            self.fuel = (self.fuel + FUEL_GAIN).min(MAX_FUEL);
            self.speed = (self.speed + THRUST).min(MAX_SPEED);
            events.push(RocketEvent::Thrust);
        } else {
            self.fuel = (self.fuel - FUEL_DRAIN).max(0.0);
            self.speed = (self.speed - DRAG).max(0.0);
            events.push(RocketEvent::Drag {
                turbulent: amplitude > self.threshold * ANGRY_FACTOR,
            });
        }

        let empty = self.fuel <= 0.0;
        if empty {
            self.speed = (self.speed - DRIFT).max(0.0);
            if !self.was_empty {
                log::info!("rocket out of fuel at distance {:.0}", self.distance);
                events.push(RocketEvent::FuelEmpty);
            }
        }
        self.was_empty = empty;

        self.distance += self.speed;
        while self.distance > (self.planets_found + 1) as f64 * PLANET_SPACING {
            self.planets_found += 1;
            events.push(RocketEvent::PlanetDiscovered {
                count: self.planets_found,
            });
        }
        events
    }

    /// The renderer detected a collision with an asteroid.
    pub fn asteroid_hit(&mut self) -> RocketEvent {
        self.fuel = (self.fuel - HIT_FUEL_COST).max(0.0);
        self.speed *= 0.5;
        RocketEvent::AsteroidHit { fuel: self.fuel }
    }

    /// Collision check for one asteroid. A hit costs fuel and speed; the
    /// renderer removes the asteroid when this returns an event.
    pub fn collide(&mut self, rocket: &Rect, asteroid: &Rect) -> Option<RocketEvent> {
        if self.phase != RocketPhase::Playing || !rocket.overlaps(asteroid) {
            return None;
        }
        Some(self.asteroid_hit())
    }

    fn record_high_score(&mut self) {
        let score = self.score();
        if score > self.high_score {
            self.high_score = score;
            self.scores.save(&score.to_string());
        }
    }
}

/// Axis-aligned overlap test the renderer uses for collisions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;

    fn flying(sensitivity: u8) -> RocketSession<MemoryStore> {
        let mut r = RocketSession::new(MemoryStore::new(), sensitivity);
        r.reset();
        r
    }

    #[test]
    fn test_ready_until_reset() {
        let mut r = RocketSession::new(MemoryStore::new(), 50);
        assert_eq!(r.phase(), RocketPhase::Ready);
        assert!(r.tick(0.0).is_empty());
        r.reset();
        assert_eq!(r.phase(), RocketPhase::Playing);
    }

    #[test]
    fn test_quiet_fuels_and_caps() {
        let mut r = flying(50); // threshold 75
        for _ in 0..1000 {
            assert_eq!(r.tick(10.0), [RocketEvent::Thrust]);
        }
        assert_eq!(r.fuel(), MAX_FUEL);
        assert_eq!(r.speed(), MAX_SPEED);
        assert!(r.distance() > 0.0);
    }

    #[test]
    fn test_noise_drags_and_empty_tank_is_forgiving() {
        let mut r = flying(50);
        r.tick(0.0);
        let ev = r.tick(80.0);
        assert_eq!(ev, [RocketEvent::Drag { turbulent: false }]);
        let ev = r.tick(200.0);
        assert_eq!(ev, [RocketEvent::Drag { turbulent: true }]);

        let mut empties = 0;
        for _ in 0..400 {
            empties += r
                .tick(200.0)
                .iter()
                .filter(|e| **e == RocketEvent::FuelEmpty)
                .count();
        }
        assert_eq!(empties, 1);
        assert_eq!(r.fuel(), 0.0);
        assert_eq!(r.speed(), 0.0);
        assert_eq!(r.phase(), RocketPhase::Playing);

        // quiet again: recovers
        assert_eq!(r.tick(0.0), [RocketEvent::Thrust]);
        assert!(r.fuel() > 0.0);
    }

    #[test]
    fn test_planets_every_spacing() {
        let mut r = flying(50);
        let mut planets = Vec::new();
        for _ in 0..2000 {
            for e in r.tick(0.0) {
                if let RocketEvent::PlanetDiscovered { count } = e {
                    planets.push(count);
                }
            }
        }
        // ~10 units/frame at full speed after the ramp
        assert_eq!(planets, (1..=r.planets_found()).collect::<Vec<_>>());
        assert_eq!(r.planets_found() as f64, (r.distance() / PLANET_SPACING).ceil() - 1.0);
        assert!(r.planets_found() >= 3);
    }

    #[test]
    fn test_asteroid_hit() {
        let mut r = flying(50);
        for _ in 0..50 {
            r.tick(0.0);
        }
        let speed = r.speed();
        let ev = r.asteroid_hit();
        assert!((r.speed() - speed / 2.0).abs() < 1e-9);
        assert_eq!(ev, RocketEvent::AsteroidHit { fuel: r.fuel() });
        for _ in 0..10 {
            r.asteroid_hit();
        }
        assert_eq!(r.fuel(), 0.0);
    }

    #[test]
    fn test_high_score_banked_on_reset() {
        let mut r = RocketSession::new(MemoryStore::with_blob("12"), 50);
        assert_eq!(r.high_score(), 12);
        r.reset();
        for _ in 0..200 {
            r.tick(0.0);
        }
        let score = r.score();
        assert!(score > 12);
        r.reset();
        assert_eq!(r.high_score(), score);
        assert_eq!(r.score(), 0);
        r.reset();
        assert_eq!(r.high_score(), score);
    }

    #[test]
    fn test_max_sensitivity_drains_in_silence() {
        let mut r = flying(100); // threshold 0
        assert_eq!(r.tick(0.0), [RocketEvent::Drag { turbulent: false }]);
        assert!(r.fuel() < START_FUEL);
    }

    #[test]
    fn test_collide_only_on_overlap() {
        let mut r = flying(50);
        for _ in 0..50 {
            r.tick(0.0);
        }
        let rocket = Rect { x: 100.0, y: 300.0, width: 64.0, height: 32.0 };
        let far = Rect { x: 400.0, y: 10.0, width: 30.0, height: 30.0 };
        let fuel = r.fuel();
        assert_eq!(r.collide(&rocket, &far), None);
        assert_eq!(r.fuel(), fuel);

        let near = Rect { x: 150.0, y: 310.0, width: 30.0, height: 30.0 };
        assert_eq!(
            r.collide(&rocket, &near),
            Some(RocketEvent::AsteroidHit { fuel: fuel - 10.0 })
        );

        // no collisions before the flight starts
        let mut idle = RocketSession::new(MemoryStore::new(), 50);
        assert_eq!(idle.collide(&rocket, &near), None);
        assert_eq!(idle.fuel(), START_FUEL);
    }

    #[test]
    fn test_rect_overlap() {
        let rocket = Rect { x: 100.0, y: 300.0, width: 64.0, height: 32.0 };
        let near = Rect { x: 150.0, y: 310.0, width: 30.0, height: 30.0 };
        let far = Rect { x: 400.0, y: 10.0, width: 30.0, height: 30.0 };
        assert!(rocket.overlaps(&near));
        assert!(!rocket.overlaps(&far));
    }
}
