//! Game state: the session state machine (stage, score, countdown, round, result).

use crate::difficulty::grid_dimension;
use crate::round::{Round, RoundGenerator};
use rand::Rng;
use rand::rngs::StdRng;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Seconds on the clock at the start of every stage.
pub const INITIAL_TIME: u32 = 15;
/// Seconds lost for picking a wrong tile.
pub const TIME_PENALTY: u32 = 3;

const STAGE_BONUS: u32 = 10;
const TIME_BONUS: u32 = 5;
const FINAL_STAGE_BONUS: u32 = 100;
const FINAL_TIME_BONUS: u32 = 10;
const FINAL_GRID_BONUS: u32 = 50;

/// Tunable timing rules. `Default` is 15 s per stage and a 3 s penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub initial_time: u32,
    pub time_penalty: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            initial_time: INITIAL_TIME,
            time_penalty: TIME_PENALTY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No session has been started yet.
    #[default]
    Idle,
    Active,
    /// Result available, no round.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Countdown reached zero.
    TimeUp,
    /// A wrong pick took the last seconds.
    Penalty,
    /// Ended on request.
    Quit,
}

/// Captured once per session at the end transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub final_stage: u32,
    pub total_elapsed_secs: u64,
    pub final_score: u32,
    pub reason: EndReason,
}

/// Trigger that was not applied. State is unchanged whenever one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("{trigger} is not accepted while {phase:?}")]
    InvalidTransition { trigger: &'static str, phase: Phase },
    #[error("tile {index} is outside the {len}-tile grid")]
    OutOfRangeSelection { index: usize, len: usize },
}

/// What an accepted transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Odd tile found; `solved` is the round that was just cleared.
    Correct { gained: u32, solved: Round },
    Wrong { penalty: u32, time_remaining: u32 },
    Ticked { time_remaining: u32 },
    /// The session ended; `round` is the round that was on screen.
    Ended {
        result: GameResult,
        round: Option<Round>,
    },
}

#[derive(Debug, Clone, Default)]
struct Session {
    stage: u32,
    score: u32,
    time_remaining: u32,
    phase: Phase,
    round: Option<Round>,
    started_at: Option<Instant>,
    last_result: Option<GameResult>,
    session_id: u64,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub stage: u32,
    pub score: u32,
    pub time_remaining: u32,
    pub phase: Phase,
    pub round: Option<&'a Round>,
    pub last_result: Option<GameResult>,
    pub session_id: u64,
}

impl Snapshot<'_> {
    #[inline]
    pub fn active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Side length of the grid for the current stage.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.round
            .map_or_else(|| grid_dimension(self.stage), Round::dimension)
    }
}

/// Owns the session and is its only writer.
#[derive(Debug)]
pub struct GameState<R = StdRng> {
    rules: Rules,
    generator: RoundGenerator<R>,
    session: Session,
}

impl<R: Rng> GameState<R> {
    pub fn new(rules: Rules, generator: RoundGenerator<R>) -> Self {
        let session = Session {
            stage: 1,
            time_remaining: rules.initial_time,
            ..Session::default()
        };
        Self {
            rules,
            generator,
            session,
        }
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.session.phase == Phase::Active
    }

    /// Number of sessions started so far; identifies the current one.
    #[inline]
    pub fn session_id(&self) -> u64 {
        self.session.session_id
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let s = &self.session;
        Snapshot {
            stage: s.stage,
            score: s.score,
            time_remaining: s.time_remaining,
            phase: s.phase,
            round: s.round.as_ref(),
            last_result: s.last_result,
            session_id: s.session_id,
        }
    }

    /// Begin a new session from any phase. Any previous result is discarded.
    pub fn start(&mut self, now: Instant) -> Snapshot<'_> {
        let session_id = self.session.session_id.wrapping_add(1);
        self.session = Session {
            stage: 1,
            score: 0,
            time_remaining: self.rules.initial_time,
            phase: Phase::Active,
            round: Some(self.generator.generate(1)),
            started_at: Some(now),
            last_result: None,
            session_id,
        };
        info!(session_id, "Session started");
        self.snapshot()
    }

    /// Player picked tile `index`.
    pub fn select_tile(&mut self, index: usize, now: Instant) -> Result<Outcome, Rejected> {
        self.require_active("select_tile")?;
        let Some(round) = self.session.round.take() else {
            return Err(self.invalid("select_tile"));
        };
        if index >= round.len() {
            let len = round.len();
            self.session.round = Some(round);
            return Err(Rejected::OutOfRangeSelection { index, len });
        }

        if index == round.target_index() {
            let s = &mut self.session;
            let gained = s
                .stage
                .saturating_mul(STAGE_BONUS)
                .saturating_add(s.time_remaining.saturating_mul(TIME_BONUS));
            s.score = s.score.saturating_add(gained);
            s.stage = s.stage.saturating_add(1);
            s.time_remaining = self.rules.initial_time;
            s.round = Some(self.generator.generate(s.stage));
            debug!(stage = s.stage, score = s.score, gained, "Correct tile");
            return Ok(Outcome::Correct {
                gained,
                solved: round,
            });
        }

        self.session.round = Some(round);
        let penalty = self.rules.time_penalty;
        self.session.time_remaining = self.session.time_remaining.saturating_sub(penalty);
        debug!(index, time_remaining = self.session.time_remaining, "Wrong tile");
        if self.session.time_remaining == 0 {
            let (result, round) = self.finish(now, EndReason::Penalty);
            return Ok(Outcome::Ended { result, round });
        }
        Ok(Outcome::Wrong {
            penalty,
            time_remaining: self.session.time_remaining,
        })
    }

    /// One unit of time elapsed.
    pub fn tick(&mut self, now: Instant) -> Result<Outcome, Rejected> {
        self.require_active("tick")?;
        self.session.time_remaining = self.session.time_remaining.saturating_sub(1);
        if self.session.time_remaining == 0 {
            let (result, round) = self.finish(now, EndReason::TimeUp);
            return Ok(Outcome::Ended { result, round });
        }
        Ok(Outcome::Ticked {
            time_remaining: self.session.time_remaining,
        })
    }

    /// End the running session on request.
    pub fn end(&mut self, now: Instant) -> Result<GameResult, Rejected> {
        self.require_active("end")?;
        let (result, _) = self.finish(now, EndReason::Quit);
        Ok(result)
    }

    /// The only path into `Ended`; callers have checked the phase.
    fn finish(&mut self, now: Instant, reason: EndReason) -> (GameResult, Option<Round>) {
        let s = &mut self.session;
        let total_elapsed_secs = s
            .started_at
            .map_or(0, |t| now.saturating_duration_since(t).as_secs());
        let grid = u32::try_from(grid_dimension(s.stage)).unwrap_or(u32::MAX);
        let final_score = s
            .score
            .saturating_add(s.stage.saturating_mul(FINAL_STAGE_BONUS))
            .saturating_add(s.time_remaining.saturating_mul(FINAL_TIME_BONUS))
            .saturating_add(grid.saturating_mul(FINAL_GRID_BONUS));
        let result = GameResult {
            final_stage: s.stage,
            total_elapsed_secs,
            final_score,
            reason,
        };
        s.phase = Phase::Ended;
        s.last_result = Some(result);
        let round = s.round.take();
        info!(
            session_id = s.session_id,
            stage = result.final_stage,
            score = result.final_score,
            elapsed = result.total_elapsed_secs,
            ?reason,
            "Session ended"
        );
        (result, round)
    }

    fn require_active(&self, trigger: &'static str) -> Result<(), Rejected> {
        if self.is_active() {
            Ok(())
        } else {
            Err(self.invalid(trigger))
        }
    }

    fn invalid(&self, trigger: &'static str) -> Rejected {
        Rejected::InvalidTransition {
            trigger,
            phase: self.session.phase,
        }
    }
}

impl GameState<StdRng> {
    /// Default rules with a seeded generator.
    pub fn seeded(rules: Rules, seed: u64) -> Self {
        Self::new(rules, RoundGenerator::seeded(seed))
    }

    pub fn from_entropy(rules: Rules) -> Self {
        Self::new(rules, RoundGenerator::from_entropy())
    }
}
