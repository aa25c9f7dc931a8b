//! App: terminal init, main loop, timers, key and mouse handling.

use crate::GameConfig;
use crate::input::{Action, Cursor, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, GridGeometry, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use oddtile::{Countdown, GameState, Outcome, Scheduler, Transition};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info};

/// How long a "+points" / "-seconds" note stays under the grid.
const TOAST_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    Result,
}

/// Short feedback line shown after a pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub positive: bool,
    pub shown_at: Instant,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    game: GameState,
    countdown: Countdown,
    scheduler: Scheduler,
    screen: Screen,
    cursor: Cursor,
    toast: Option<Toast>,
    /// TachyonFX fade for the reveal (created on the first revealed frame).
    reveal_effect: Option<Effect>,
    /// Last time we processed the reveal effect (for delta).
    reveal_effect_process_time: Option<Instant>,
    /// The current grid does not fit the terminal; the countdown is held.
    too_small: bool,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let game = match config.seed {
            Some(seed) => GameState::seeded(config.rules, seed),
            None => GameState::from_entropy(config.rules),
        };
        let mut app = Self {
            countdown: Countdown::new(config.tick_interval),
            config,
            theme,
            game,
            scheduler: Scheduler::default(),
            screen: Screen::Menu,
            cursor: Cursor::default(),
            toast: None,
            reveal_effect: None,
            reveal_effect_process_time: None,
            too_small: false,
        };
        if app.config.no_menu {
            app.start_session(Instant::now());
        }
        app
    }

    /// Start (or restart) a session. Drops any reveal still pending from the last one.
    fn start_session(&mut self, now: Instant) {
        self.scheduler.cancel();
        self.game.start(now);
        self.resume_countdown(now);
        self.cursor = Cursor::default();
        self.toast = None;
        self.clear_effect();
        self.screen = Screen::Playing;
    }

    /// Arm the countdown unless the grid is hidden behind the size notice.
    fn resume_countdown(&mut self, now: Instant) {
        if self.too_small {
            self.countdown.disarm();
        } else {
            self.countdown.arm(now);
        }
    }

    /// Track whether the current grid fits `area`. The clock stops while it
    /// does not and restarts with a full interval once it does again.
    fn sync_viewport(&mut self, area: Rect, now: Instant) {
        let dimension = self.game.snapshot().dimension();
        let fits = GridGeometry::fit(ui::playing_layout(area).grid, dimension).is_some();
        if fits != self.too_small {
            return;
        }
        self.too_small = !fits;
        debug!(dimension, ?area, too_small = self.too_small, "Viewport changed");
        if self.game.is_active() && !self.scheduler.is_pending() {
            self.resume_countdown(now);
        }
    }

    fn clear_effect(&mut self) {
        self.reveal_effect = None;
        self.reveal_effect_process_time = None;
    }

    /// Pick a tile. Ignored while a reveal is on screen.
    fn select(&mut self, index: usize, now: Instant) {
        if self.scheduler.is_pending() {
            return;
        }
        match self.game.select_tile(index, now) {
            Ok(outcome) => self.apply_outcome(outcome, now),
            Err(rejected) => debug!(%rejected, "Selection ignored"),
        }
    }

    fn end_session(&mut self, now: Instant) {
        if self.scheduler.is_pending() {
            return;
        }
        let round = self.game.snapshot().round.cloned();
        match self.game.end(now) {
            Ok(result) => self.apply_outcome(Outcome::Ended { result, round }, now),
            Err(rejected) => debug!(%rejected, "End ignored"),
        }
    }

    fn show_toast(&mut self, text: String, positive: bool, now: Instant) {
        self.toast = Some(Toast {
            text,
            positive,
            shown_at: now,
        });
    }

    fn apply_outcome(&mut self, outcome: Outcome, now: Instant) {
        let session_id = self.game.session_id();
        match outcome {
            Outcome::Correct { gained, solved } => {
                self.show_toast(format!("+{gained}"), true, now);
                self.cursor.clamp(self.game.snapshot().dimension());
                self.countdown.disarm();
                if self.config.correct_reveal.is_zero() {
                    self.resume_countdown(now);
                } else {
                    self.scheduler.schedule(
                        Transition::ResumePlay,
                        session_id,
                        now,
                        self.config.correct_reveal,
                        Some(solved),
                    );
                }
            }
            Outcome::Wrong { penalty, .. } => {
                self.show_toast(format!("-{penalty}s"), false, now);
            }
            Outcome::Ticked { .. } => {}
            Outcome::Ended { result, round } => {
                self.countdown.disarm();
                info!(score = result.final_score, stage = result.final_stage, "Game over");
                if self.config.end_reveal.is_zero() || round.is_none() {
                    self.show_result();
                } else {
                    self.scheduler.schedule(
                        Transition::ShowResult,
                        session_id,
                        now,
                        self.config.end_reveal,
                        round,
                    );
                }
            }
        }
    }

    fn show_result(&mut self) {
        self.clear_effect();
        self.toast = None;
        self.screen = Screen::Result;
    }

    /// Fire due reveal transitions and countdown ticks, then expire the toast.
    fn poll_timers(&mut self, now: Instant) {
        match self.scheduler.poll(now, self.game.session_id()) {
            Some(Transition::ResumePlay) => {
                self.clear_effect();
                if self.game.is_active() {
                    self.resume_countdown(now);
                }
            }
            Some(Transition::ShowResult) => self.show_result(),
            None => {}
        }
        while let Some(outcome) = self.countdown.poll(now, &mut self.game) {
            self.apply_outcome(outcome, now);
        }
        if self
            .toast
            .as_ref()
            .is_some_and(|t| now.saturating_duration_since(t.shown_at) >= TOAST_DURATION)
        {
            self.toast = None;
        }
    }

    /// Handle one key action. Returns `true` when the app should exit.
    fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        match (self.screen, action) {
            (_, Action::Quit) => return true,
            (Screen::Menu, Action::Select) => self.start_session(now),
            (Screen::Playing, Action::Up | Action::Down | Action::Left | Action::Right) => {
                let dimension = self.game.snapshot().dimension();
                self.cursor.step(action, dimension);
            }
            (Screen::Playing, Action::Select) => {
                let index = self.cursor.index(self.game.snapshot().dimension());
                self.select(index, now);
            }
            (Screen::Playing, Action::End) => self.end_session(now),
            (Screen::Playing | Screen::Result, Action::Restart)
            | (Screen::Result, Action::Select) => self.start_session(now),
            _ => {}
        }
        false
    }

    /// Left click on a tile moves the cursor there and picks it.
    fn handle_click(&mut self, column: u16, row: u16, area: Rect, now: Instant) {
        if self.screen != Screen::Playing || self.scheduler.is_pending() {
            return;
        }
        let dimension = self.game.snapshot().dimension();
        let grid_area = ui::playing_layout(area).grid;
        let Some(index) =
            GridGeometry::fit(grid_area, dimension).and_then(|g| g.tile_at(column, row))
        else {
            return;
        };
        self.cursor = Cursor {
            row: index / dimension,
            col: index % dimension,
        };
        self.select(index, now);
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            self.poll_timers(now);

            let view = View {
                screen: self.screen,
                snapshot: self.game.snapshot(),
                theme: &self.theme,
                cursor: self.cursor,
                time_limit: self.game.rules().initial_time,
                tick_progress: self.countdown.progress(now),
                revealed: self.scheduler.pending().and_then(|p| p.revealed.as_ref()),
                toast: self.toast.as_ref(),
                now,
                no_animation: self.config.no_animation,
            };
            let mut area = Rect::default();
            terminal.draw(|f| {
                area = f.area();
                ui::draw(
                    f,
                    &view,
                    &mut self.reveal_effect,
                    &mut self.reveal_effect_process_time,
                );
            })?;
            self.sync_viewport(area, now);

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let now = Instant::now();
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.handle_action(key_to_action(key), now) {
                                info!("Quit requested");
                                return Ok(());
                            }
                        }
                        Event::Mouse(MouseEvent {
                            kind: MouseEventKind::Down(MouseButton::Left),
                            column,
                            row,
                            ..
                        }) => self.handle_click(column, row, area, now),
                        _ => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddtile::{Phase, Rules};

    fn config() -> GameConfig {
        GameConfig {
            rules: Rules::default(),
            tick_interval: Duration::from_secs(1),
            correct_reveal: Duration::from_millis(500),
            end_reveal: Duration::from_millis(1000),
            seed: Some(7),
            frame_rate: 30.0,
            no_menu: false,
            no_animation: true,
        }
    }

    fn playing() -> (App, Instant) {
        let mut app = App::new(config(), Theme::default());
        let t0 = Instant::now();
        assert!(!app.handle_action(Action::Select, t0));
        assert_eq!(app.screen, Screen::Playing);
        (app, t0)
    }

    fn target(app: &App) -> usize {
        app.game
            .snapshot()
            .round
            .map(oddtile::Round::target_index)
            .unwrap()
    }

    fn wrong(app: &App) -> usize {
        usize::from(target(app) == 0)
    }

    #[test]
    fn test_menu_then_start() {
        let app = App::new(config(), Theme::default());
        assert_eq!(app.screen, Screen::Menu);
        assert_eq!(app.game.phase(), Phase::Idle);
        let (app, _) = playing();
        assert!(app.game.is_active());
        assert!(app.countdown.is_armed());
    }

    #[test]
    fn test_no_menu_starts_immediately() {
        let app = App::new(
            GameConfig {
                no_menu: true,
                ..config()
            },
            Theme::default(),
        );
        assert_eq!(app.screen, Screen::Playing);
        assert!(app.game.is_active());
    }

    #[test]
    fn test_correct_pick_reveals_then_resumes() {
        let (mut app, t0) = playing();
        app.select(target(&app), t0);
        assert_eq!(app.game.snapshot().stage, 2);
        assert!(app.scheduler.is_pending());
        assert!(!app.countdown.is_armed());
        assert!(app.toast.as_ref().is_some_and(|t| t.positive));

        // Input is ignored during the reveal.
        app.select(0, t0 + Duration::from_millis(100));
        assert_eq!(app.game.snapshot().stage, 2);
        assert_eq!(app.game.snapshot().time_remaining, 15);

        app.poll_timers(t0 + Duration::from_millis(500));
        assert!(!app.scheduler.is_pending());
        assert!(app.countdown.is_armed());
        assert_eq!(app.screen, Screen::Playing);
    }

    #[test]
    fn test_clock_frozen_during_reveal() {
        let (mut app, t0) = playing();
        app.select(target(&app), t0 + Duration::from_millis(900));
        app.poll_timers(t0 + Duration::from_millis(1200));
        assert_eq!(app.game.snapshot().time_remaining, 15);
    }

    #[test]
    fn test_wrong_pick_shows_penalty() {
        let (mut app, t0) = playing();
        app.select(wrong(&app), t0);
        assert_eq!(app.game.snapshot().time_remaining, 12);
        let toast = app.toast.clone().unwrap();
        assert_eq!(toast.text, "-3s");
        assert!(!toast.positive);
        app.poll_timers(t0 + TOAST_DURATION);
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_timeout_goes_to_result_after_reveal() {
        let (mut app, t0) = playing();
        app.poll_timers(t0 + Duration::from_secs(15));
        assert_eq!(app.game.phase(), Phase::Ended);
        assert_eq!(app.screen, Screen::Playing);
        assert!(app.scheduler.pending().is_some_and(|p| p.revealed.is_some()));

        app.poll_timers(t0 + Duration::from_secs(16));
        assert_eq!(app.screen, Screen::Result);
    }

    #[test]
    fn test_end_key_and_restart() {
        let (mut app, t0) = playing();
        app.handle_action(Action::End, t0 + Duration::from_secs(1));
        assert_eq!(app.game.phase(), Phase::Ended);
        let first = app.game.session_id();

        // Restart during the end reveal: the old transition must never fire.
        app.handle_action(Action::Restart, t0 + Duration::from_millis(1200));
        assert!(app.game.is_active());
        assert_ne!(app.game.session_id(), first);
        app.poll_timers(t0 + Duration::from_secs(3));
        assert_eq!(app.screen, Screen::Playing);
        assert!(app.game.is_active());
    }

    #[test]
    fn test_zero_reveal_skips_hold() {
        let mut app = App::new(
            GameConfig {
                correct_reveal: Duration::ZERO,
                end_reveal: Duration::ZERO,
                ..config()
            },
            Theme::default(),
        );
        let t0 = Instant::now();
        app.handle_action(Action::Select, t0);
        app.select(target(&app), t0);
        assert!(!app.scheduler.is_pending());
        assert!(app.countdown.is_armed());
        app.handle_action(Action::End, t0);
        assert_eq!(app.screen, Screen::Result);
    }

    #[test]
    fn test_click_selects_tile_under_pointer() {
        let (mut app, t0) = playing();
        let area = Rect::new(0, 0, 80, 30);
        let index = target(&app);
        let geom = GridGeometry::fit(ui::playing_layout(area).grid, 2).unwrap();
        let r = geom.tile_rect(index);
        app.handle_click(r.x, r.y, area, t0);
        assert_eq!(app.cursor.index(2), index);
        assert_eq!(app.game.snapshot().stage, 2);
    }

    #[test]
    fn test_clock_held_while_grid_does_not_fit() {
        let (mut app, t0) = playing();
        app.sync_viewport(Rect::new(0, 0, 20, 8), t0);
        assert!(app.too_small);
        assert!(!app.countdown.is_armed());
        app.poll_timers(t0 + Duration::from_secs(5));
        assert_eq!(app.game.snapshot().time_remaining, 15);

        // Clicks cannot reach a grid that is not drawn.
        app.handle_click(10, 5, Rect::new(0, 0, 20, 8), t0 + Duration::from_secs(5));
        assert_eq!(app.game.snapshot().stage, 1);

        app.sync_viewport(Rect::new(0, 0, 80, 24), t0 + Duration::from_secs(5));
        assert!(!app.too_small);
        assert!(app.countdown.is_armed());
        app.poll_timers(t0 + Duration::from_secs(6));
        assert_eq!(app.game.snapshot().time_remaining, 14);
    }

    #[test]
    fn test_reveal_does_not_resume_clock_on_small_terminal() {
        let (mut app, t0) = playing();
        app.select(target(&app), t0);
        app.sync_viewport(Rect::new(0, 0, 20, 8), t0);
        assert!(app.too_small);
        app.poll_timers(t0 + Duration::from_millis(500));
        assert!(!app.scheduler.is_pending());
        assert!(!app.countdown.is_armed());
        app.poll_timers(t0 + Duration::from_secs(5));
        assert_eq!(app.game.snapshot().time_remaining, 15);
    }

    #[test]
    fn test_quit_from_any_screen() {
        let (mut app, t0) = playing();
        assert!(app.handle_action(Action::Quit, t0));
    }
}
