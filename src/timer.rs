//! Countdown driver and deferred reveal transitions.

use crate::game::{GameState, Outcome};
use crate::round::Round;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::debug;

/// One game second.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Hold on the solved grid after a correct pick.
pub const CORRECT_REVEAL: Duration = Duration::from_millis(500);
/// Hold on the last grid before the result screen.
pub const END_REVEAL: Duration = Duration::from_millis(1000);

/// Issues `tick()` once per interval while the session is active.
///
/// Deadlines advance by exactly one interval per tick, so a late poll catches
/// up one tick at a time instead of merging several into one.
#[derive(Debug, Clone)]
pub struct Countdown {
    interval: Duration,
    next_tick: Option<Instant>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Countdown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_tick: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start counting; the first tick is due one interval after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.next_tick = Some(now + self.interval);
    }

    pub fn disarm(&mut self) {
        self.next_tick = None;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Fraction of the current interval already elapsed (0.0 when disarmed).
    pub fn progress(&self, now: Instant) -> f64 {
        self.next_tick.map_or(0.0, |due| {
            let left = due.saturating_duration_since(now).as_secs_f64();
            (1.0 - left / self.interval.as_secs_f64()).clamp(0.0, 1.0)
        })
    }

    /// Deliver at most one due tick. Disarms as soon as the session is no
    /// longer active, including when this tick ended it.
    pub fn poll<R: Rng>(&mut self, now: Instant, game: &mut GameState<R>) -> Option<Outcome> {
        let due = self.next_tick?;
        if !game.is_active() {
            self.disarm();
            return None;
        }
        if now < due {
            return None;
        }
        self.next_tick = Some(due + self.interval);
        match game.tick(now) {
            Ok(outcome) => {
                if matches!(outcome, Outcome::Ended { .. }) {
                    self.disarm();
                }
                Some(outcome)
            }
            Err(rejected) => {
                debug!(%rejected, "Countdown stopped");
                self.disarm();
                None
            }
        }
    }
}

/// What happens when a reveal hold expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Return to the (already advanced) next round.
    ResumePlay,
    /// Show the result screen.
    ShowResult,
}

/// A transition deferred until `deadline`, bound to the session that scheduled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    pub kind: Transition,
    pub session_id: u64,
    pub deadline: Instant,
    /// Grid shown with its odd tile highlighted while waiting.
    pub revealed: Option<Round>,
}

/// Holds at most one pending transition.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Option<PendingTransition>,
}

impl Scheduler {
    /// Replace any pending transition with a new one due `delay` after `now`.
    pub fn schedule(
        &mut self,
        kind: Transition,
        session_id: u64,
        now: Instant,
        delay: Duration,
        revealed: Option<Round>,
    ) {
        self.pending = Some(PendingTransition {
            kind,
            session_id,
            deadline: now + delay,
            revealed,
        });
    }

    /// Drop the pending transition without firing it.
    pub fn cancel(&mut self) -> Option<PendingTransition> {
        let cancelled = self.pending.take();
        if let Some(p) = &cancelled {
            debug!(kind = ?p.kind, session_id = p.session_id, "Pending transition cancelled");
        }
        cancelled
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Fire the pending transition once its deadline has passed. A transition
    /// scheduled by another session is discarded instead.
    pub fn poll(&mut self, now: Instant, session_id: u64) -> Option<Transition> {
        let pending = self.pending.as_ref()?;
        if pending.session_id != session_id {
            debug!(
                stale = pending.session_id,
                current = session_id,
                "Discarding stale transition"
            );
            self.pending = None;
            return None;
        }
        if now < pending.deadline {
            return None;
        }
        self.pending.take().map(|p| p.kind)
    }
}
