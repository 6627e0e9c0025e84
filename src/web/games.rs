//! JS-facing wrappers for the rocket and math-race pages. Each page owns its
//! game object and drives it from its own loop / click handlers.

use wasm_bindgen::prelude::*;

use super::js_error;
use super::storage::LocalStorageStore;
use crate::race::{AwardOutcome, MathRace, RacePhase, Team};
use crate::rng::{DefaultSource, RandomSource, default_source};
use crate::rocket::{Rect, RocketPhase, RocketSession};

const HIGH_SCORE_KEY: &str = "space_highscore";

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

#[wasm_bindgen]
pub struct RocketGame {
    session: RocketSession<LocalStorageStore>,
    rng: DefaultSource,
}

#[wasm_bindgen]
impl RocketGame {
    #[wasm_bindgen(constructor)]
    pub fn new(sensitivity: u8) -> RocketGame {
        Self {
            session: RocketSession::new(LocalStorageStore::new(HIGH_SCORE_KEY), sensitivity),
            rng: default_source(),
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(js_name = setSensitivity)]
    pub fn set_sensitivity(&mut self, sensitivity: u8) {
        self.session.set_sensitivity(sensitivity);
    }

    /// Advance one frame; returns the frame's events as a JSON array.
    pub fn tick(&mut self, amplitude: f64) -> Result<String, JsValue> {
        to_json(&self.session.tick(amplitude))
    }

    #[wasm_bindgen(js_name = asteroidHit)]
    pub fn asteroid_hit(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.asteroid_hit())
    }

    /// Test the rocket's box against a square asteroid. Returns the hit
    /// event as JSON, or `undefined` when they do not touch.
    #[wasm_bindgen(js_name = checkCollision)]
    #[allow(clippy::too_many_arguments)]
    pub fn check_collision(
        &mut self,
        rocket_x: f64,
        rocket_y: f64,
        rocket_width: f64,
        rocket_height: f64,
        asteroid_x: f64,
        asteroid_y: f64,
        asteroid_size: f64,
    ) -> Result<Option<String>, JsValue> {
        let rocket = Rect {
            x: rocket_x,
            y: rocket_y,
            width: rocket_width,
            height: rocket_height,
        };
        let asteroid = Rect {
            x: asteroid_x,
            y: asteroid_y,
            width: asteroid_size,
            height: asteroid_size,
        };
        self.session
            .collide(&rocket, &asteroid)
            .map(|event| to_json(&event))
            .transpose()
    }

    #[wasm_bindgen(js_name = shouldSpawnAsteroid)]
    pub fn should_spawn_asteroid(&mut self) -> bool {
        let p = self.session.spawn_chance();
        self.rng.chance(p)
    }

    pub fn playing(&self) -> bool {
        self.session.phase() == RocketPhase::Playing
    }

    pub fn fuel(&self) -> f64 {
        self.session.fuel()
    }

    #[wasm_bindgen(js_name = lowFuel)]
    pub fn low_fuel(&self) -> bool {
        self.session.low_fuel()
    }

    pub fn speed(&self) -> f64 {
        self.session.speed()
    }

    pub fn score(&self) -> f64 {
        self.session.score() as f64
    }

    #[wasm_bindgen(js_name = highScore)]
    pub fn high_score(&self) -> f64 {
        self.session.high_score() as f64
    }

    #[wasm_bindgen(js_name = planetsFound)]
    pub fn planets_found(&self) -> u32 {
        self.session.planets_found()
    }
}

#[wasm_bindgen]
pub struct MathRaceGame {
    race: MathRace,
    rng: DefaultSource,
}

fn parse_team(team: &str) -> Result<Team, JsValue> {
    match team {
        "A" | "a" => Ok(Team::A),
        "B" | "b" => Ok(Team::B),
        other => Err(js_error(format!("unknown team '{other}'"))),
    }
}

#[wasm_bindgen]
impl MathRaceGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> MathRaceGame {
        Self {
            race: MathRace::default(),
            rng: default_source(),
        }
    }

    pub fn start(&mut self) {
        self.race.start(&mut self.rng);
    }

    pub fn banner(&self) -> String {
        self.race.banner()
    }

    /// Option values in display order.
    pub fn options(&self) -> Vec<i32> {
        self.race.options().to_vec()
    }

    /// `true` when the answer was right and a team should now be picked.
    #[wasm_bindgen(js_name = checkAnswer)]
    pub fn check_answer(&mut self, value: i32) -> Result<bool, JsValue> {
        use crate::race::AnswerOutcome;
        let outcome = self.race.check_answer(value).map_err(js_error)?;
        Ok(outcome == AnswerOutcome::Correct)
    }

    /// `true` when this point won the race.
    #[wasm_bindgen(js_name = awardPoint)]
    pub fn award_point(&mut self, team: &str) -> Result<bool, JsValue> {
        let team = parse_team(team)?;
        let outcome = self.race.award_point(team, &mut self.rng).map_err(js_error)?;
        Ok(matches!(outcome, AwardOutcome::Won(_)))
    }

    #[wasm_bindgen(js_name = positionA)]
    pub fn position_a(&self) -> u32 {
        self.race.positions().0
    }

    #[wasm_bindgen(js_name = positionB)]
    pub fn position_b(&self) -> u32 {
        self.race.positions().1
    }

    /// Winner banner text once the race is over.
    pub fn winner(&self) -> Option<String> {
        match self.race.phase() {
            RacePhase::Finished { winner } => Some(format!("{} WINS!", winner.label())),
            _ => None,
        }
    }
}

impl Default for MathRaceGame {
    fn default() -> Self {
        Self::new()
    }
}
