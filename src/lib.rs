//! oddtile core: difficulty curve, round generation, session state machine and countdown.
//!
//! The terminal front end in `main.rs` only talks to [`game::GameState`] through
//! its transitions and [`game::Snapshot`]; nothing here renders.

pub mod difficulty;
pub mod game;
pub mod round;
pub mod timer;

pub use game::{EndReason, GameResult, GameState, Outcome, Phase, Rejected, Rules, Snapshot};
pub use round::{Channel, Rgb, Round, RoundGenerator, Tile};
pub use timer::{Countdown, PendingTransition, Scheduler, Transition};
