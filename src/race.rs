//! Teacher-run math race. The teacher reads a question, the class shouts the
//! answer, the teacher clicks the option that was called and then the team
//! that called it. First racer to the top wins.

use serde::Serialize;
use thiserror::Error;

use crate::rng::{RandomSource, shuffle};

pub const START_POSITION: u32 = 20;
pub const BOOST: u32 = 15;
pub const WIN_HEIGHT: u32 = 85;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
    pub prompt: &'static str,
    pub answer: i32,
    pub options: [i32; 3],
}

pub const QUESTIONS: &[Question] = &[
    Question { prompt: "5 + 7", answer: 12, options: [12, 11, 15] },
    Question { prompt: "9 - 4", answer: 5, options: [5, 4, 6] },
    Question { prompt: "3 x 3", answer: 9, options: [6, 9, 12] },
    Question { prompt: "Double 8", answer: 16, options: [16, 18, 14] },
    Question { prompt: "10 + 10", answer: 20, options: [10, 20, 30] },
    Question { prompt: "15 - 5", answer: 10, options: [5, 10, 15] },
    Question { prompt: "6 + 6", answer: 12, options: [10, 12, 14] },
    Question { prompt: "Half of 20", answer: 10, options: [5, 10, 2] },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Team {
    A, // rocket
    B, // UFO
}

impl Team {
    pub fn label(self) -> &'static str {
        match self {
            Team::A => "TEAM A (ROCKET)",
            Team::B => "TEAM B (UFO)",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum RacePhase {
    Idle,
    Asking,
    AwaitingTeam,
    Finished { winner: Team },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    TryAgain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AwardOutcome {
    NextQuestion,
    Won(Team),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RaceError {
    #[error("the race has not started")]
    NotStarted,

    #[error("no correct answer is waiting for a team")]
    NoAnswerPending,

    #[error("waiting for the teacher to pick a team")]
    TeamPending,

    #[error("the race is over")]
    Finished,
}

#[derive(Clone, Debug)]
pub struct MathRace {
    bank: &'static [Question],
    current: Option<Question>,
    options: [i32; 3], // shuffled display order
    pos_a: u32,
    pos_b: u32,
    phase: RacePhase,
}

impl Default for MathRace {
    fn default() -> Self {
        Self::new(QUESTIONS)
    }
}

impl MathRace {
    pub fn new(bank: &'static [Question]) -> Self {
        Self {
            bank,
            current: None,
            options: [0; 3],
            pos_a: 0,
            pos_b: 0,
            phase: RacePhase::Idle,
        }
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn positions(&self) -> (u32, u32) {
        (self.pos_a, self.pos_b)
    }

    pub fn question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn options(&self) -> [i32; 3] {
        self.options
    }

    /// Text for the question banner.
    pub fn banner(&self) -> String {
        match (self.phase, &self.current) {
            (RacePhase::Finished { .. }, _) => "FINISH!".to_string(),
            (_, Some(q)) => format!("{} = ?", q.prompt),
            (_, None) => String::new(),
        }
    }

    pub fn start(&mut self, rng: &mut impl RandomSource) {
        self.pos_a = START_POSITION;
        self.pos_b = START_POSITION;
        self.next_question(rng);
    }

    pub fn next_question(&mut self, rng: &mut impl RandomSource) {
        if self.bank.is_empty() {
            log::warn!("math race has an empty question bank");
            return;
        }
        let q = self.bank[rng.index(self.bank.len())];
        let mut options = q.options;
        shuffle(&mut options, rng);
        self.current = Some(q);
        self.options = options;
        self.phase = RacePhase::Asking;
    }

    pub fn check_answer(&mut self, value: i32) -> Result<AnswerOutcome, RaceError> {
        match self.phase {
            RacePhase::Idle => return Err(RaceError::NotStarted),
            RacePhase::AwaitingTeam => return Err(RaceError::TeamPending),
            RacePhase::Finished { .. } => return Err(RaceError::Finished),
            RacePhase::Asking => {}
        }
        let q = self.current.ok_or(RaceError::NotStarted)?;
        if value == q.answer {
            self.phase = RacePhase::AwaitingTeam;
            Ok(AnswerOutcome::Correct)
        } else {
            Ok(AnswerOutcome::TryAgain)
        }
    }

    pub fn award_point(
        &mut self,
        team: Team,
        rng: &mut impl RandomSource,
    ) -> Result<AwardOutcome, RaceError> {
        match self.phase {
            RacePhase::AwaitingTeam => {}
            RacePhase::Finished { .. } => return Err(RaceError::Finished),
            _ => return Err(RaceError::NoAnswerPending),
        }
        let pos = match team {
            Team::A => &mut self.pos_a,
            Team::B => &mut self.pos_b,
        };
        *pos += BOOST;
        if *pos >= WIN_HEIGHT {
            log::info!("{} wins the math race", team.label());
            self.phase = RacePhase::Finished { winner: team };
            return Ok(AwardOutcome::Won(team));
        }
        self.next_question(rng);
        Ok(AwardOutcome::NextQuestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Lcg;

    #[test]
    fn test_bank_answers_are_offered() {
        for q in QUESTIONS {
            assert!(q.options.contains(&q.answer), "{} missing its answer", q.prompt);
        }
    }

    #[test]
    fn test_race_to_victory() {
        let mut rng = Lcg::new(11);
        let mut race = MathRace::default();
        assert_eq!(race.check_answer(1), Err(RaceError::NotStarted));
        race.start(&mut rng);
        assert_eq!(race.positions(), (20, 20));
        assert_eq!(race.phase(), RacePhase::Asking);
        assert!(race.banner().ends_with(" = ?"));

        let answer = race.question().unwrap().answer;
        let mut shown = race.options();
        shown.sort();
        let mut expected = race.question().unwrap().options;
        expected.sort();
        assert_eq!(shown, expected);

        assert_eq!(race.award_point(Team::A, &mut rng), Err(RaceError::NoAnswerPending));
        assert_eq!(race.check_answer(answer + 1000), Ok(AnswerOutcome::TryAgain));
        assert_eq!(race.check_answer(answer), Ok(AnswerOutcome::Correct));
        assert_eq!(race.check_answer(answer), Err(RaceError::TeamPending));

        // 20 -> 35 -> 50 -> 65 -> 80 -> 95
        let mut outcome = race.award_point(Team::B, &mut rng).unwrap();
        let mut rounds = 1;
        while outcome == AwardOutcome::NextQuestion {
            let a = race.question().unwrap().answer;
            race.check_answer(a).unwrap();
            outcome = race.award_point(Team::B, &mut rng).unwrap();
            rounds += 1;
        }
        assert_eq!(rounds, 5);
        assert_eq!(outcome, AwardOutcome::Won(Team::B));
        assert_eq!(race.positions(), (20, 95));
        assert_eq!(race.phase(), RacePhase::Finished { winner: Team::B });
        assert_eq!(race.banner(), "FINISH!");
        assert_eq!(race.check_answer(1), Err(RaceError::Finished));
    }
}
