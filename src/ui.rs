//! Layout and drawing: menu, grid, status bar, reveal, result screen.

use crate::app::{Screen, Toast};
use crate::input::Cursor;
use crate::theme::Theme;
use oddtile::{EndReason, GameResult, Rgb, Round, Snapshot};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Fade of the non-target tiles while a solved grid is revealed.
const REVEAL_FADE_MS: u32 = 350;
/// Countdown bar turns to the warning colour at or below this many seconds.
const LOW_TIME_SECS: u32 = 5;
const TITLE: &str = " oddtile ";

#[inline]
pub const fn tile_color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Regions of the playing screen. Shared by drawing and mouse hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayingLayout {
    pub status: Rect,
    pub gauge: Rect,
    pub grid: Rect,
    pub toast: Rect,
    pub hints: Rect,
}

pub fn playing_layout(area: Rect) -> PlayingLayout {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // stage / score / time
            Constraint::Length(1), // countdown bar
            Constraint::Length(1), // gap
            Constraint::Fill(1),   // grid
            Constraint::Length(1), // toast
            Constraint::Length(1), // key hints
        ])
        .split(inner);
    PlayingLayout {
        status: chunks[0],
        gauge: chunks[1],
        grid: chunks[3],
        toast: chunks[4],
        hints: chunks[5],
    }
}

/// Placement of a `dimension` x `dimension` grid of tiles inside an area.
/// Tiles are twice as wide as tall so they look square in a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub x: u16,
    pub y: u16,
    pub tile_w: u16,
    pub tile_h: u16,
    pub gap_x: u16,
    pub gap_y: u16,
    pub dimension: u16,
}

impl GridGeometry {
    /// Largest tiles that fit, trying wide gaps first. `None` when even
    /// one cell per tile with no gaps does not fit.
    pub fn fit(area: Rect, dimension: usize) -> Option<Self> {
        const GAPS: [(u16, u16); 3] = [(2, 1), (1, 0), (0, 0)];
        let n = u16::try_from(dimension.max(1)).ok()?;
        let mut best: Option<Self> = None;
        for (gap_x, gap_y) in GAPS {
            let Some(candidate) = Self::with_gaps(area, n, gap_x, gap_y) else {
                continue;
            };
            if best.is_none_or(|b| candidate.tile_h > b.tile_h) {
                best = Some(candidate);
            }
        }
        best
    }

    fn with_gaps(area: Rect, n: u16, gap_x: u16, gap_y: u16) -> Option<Self> {
        let avail_w = area.width.checked_sub(gap_x.checked_mul(n - 1)?)?;
        let avail_h = area.height.checked_sub(gap_y.checked_mul(n - 1)?)?;
        if avail_w / n == 0 || avail_h / n == 0 {
            return None;
        }
        let tile_h = (avail_h / n).min(avail_w / n / 2).max(1);
        let tile_w = (tile_h * 2).min(avail_w / n);
        let grid_w = n * tile_w + gap_x * (n - 1);
        let grid_h = n * tile_h + gap_y * (n - 1);
        Some(Self {
            x: area.x + (area.width - grid_w) / 2,
            y: area.y + (area.height - grid_h) / 2,
            tile_w,
            tile_h,
            gap_x,
            gap_y,
            dimension: n,
        })
    }

    /// Whole grid, tiles and gaps.
    pub fn bounds(&self) -> Rect {
        let n = self.dimension;
        Rect {
            x: self.x,
            y: self.y,
            width: n.saturating_mul(self.tile_w) + self.gap_x * (n - 1),
            height: n.saturating_mul(self.tile_h) + self.gap_y * (n - 1),
        }
    }

    pub fn tile_rect(&self, index: usize) -> Rect {
        let n = usize::from(self.dimension);
        let (row, col) = ((index / n) as u16, (index % n) as u16);
        Rect {
            x: self.x + col * (self.tile_w + self.gap_x),
            y: self.y + row * (self.tile_h + self.gap_y),
            width: self.tile_w,
            height: self.tile_h,
        }
    }

    /// Tile index under terminal cell (`column`, `row`); gaps hit nothing.
    pub fn tile_at(&self, column: u16, row: u16) -> Option<usize> {
        let dx = column.checked_sub(self.x)?;
        let dy = row.checked_sub(self.y)?;
        let stride_x = self.tile_w + self.gap_x;
        let stride_y = self.tile_h + self.gap_y;
        let (col, row) = (dx / stride_x, dy / stride_y);
        if col >= self.dimension
            || row >= self.dimension
            || dx % stride_x >= self.tile_w
            || dy % stride_y >= self.tile_h
        {
            return None;
        }
        Some(usize::from(row) * usize::from(self.dimension) + usize::from(col))
    }
}

/// Everything the renderer reads for one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub snapshot: Snapshot<'a>,
    pub theme: &'a Theme,
    pub cursor: Cursor,
    /// Seconds each stage starts with.
    pub time_limit: u32,
    /// Fraction of the current second already elapsed.
    pub tick_progress: f64,
    /// Solved grid held on screen, if a reveal is pending.
    pub revealed: Option<&'a Round>,
    pub toast: Option<&'a Toast>,
    pub now: Instant,
    pub no_animation: bool,
}

/// Draw current screen. While a grid is revealed and animation is on, applies
/// the TachyonFX fade and updates `reveal_effect` / `reveal_process_time`.
pub fn draw(
    frame: &mut Frame,
    view: &View<'_>,
    reveal_effect: &mut Option<Effect>,
    reveal_process_time: &mut Option<Instant>,
) {
    let area = frame.area();
    let bg = Block::default().style(Style::default().bg(view.theme.bg));
    bg.render(area, frame.buffer_mut());
    match view.screen {
        Screen::Menu => draw_menu(frame, view, area),
        Screen::Playing => {
            draw_playing(frame, view, area);
            if let Some(round) = view.revealed {
                if !view.no_animation {
                    apply_reveal_effect(
                        frame,
                        view,
                        round,
                        area,
                        reveal_effect,
                        reveal_process_time,
                    );
                }
            }
        }
        Screen::Result => draw_result(frame, view, area),
    }
}

fn outer_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(TITLE, Style::default().fg(theme.title)))
}

fn draw_menu(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let dim = Style::default().fg(theme.inactive_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Find the odd tile ",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "One tile in the grid is a slightly different colour.",
            fg,
        )),
        Line::from(Span::styled(
            "Pick it before the clock runs out. Every stage the grid grows",
            fg,
        )),
        Line::from(Span::styled("and the difference gets smaller.", fg)),
        Line::from(""),
        Line::from(Span::styled(
            "Wrong picks cost seconds; fast picks score more.",
            dim,
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Enter — Start    Q — Quit ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(outer_block(theme))
        .render(area, frame.buffer_mut());
}

fn draw_playing(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let snap = &view.snapshot;
    outer_block(theme).render(area, frame.buffer_mut());
    let layout = playing_layout(area);

    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let low = snap.time_remaining <= LOW_TIME_SECS;
    let time_color = if low { theme.time_low } else { theme.time_ok };
    let status = Line::from(vec![
        Span::styled("Stage: ", title_style),
        Span::styled(snap.stage.to_string(), fg_style),
        Span::raw("    "),
        Span::styled("Score: ", title_style),
        Span::styled(snap.score.to_string(), fg_style),
        Span::raw("    "),
        Span::styled("Time: ", title_style),
        Span::styled(
            format!("{}s", snap.time_remaining),
            Style::default().fg(time_color).add_modifier(Modifier::BOLD),
        ),
    ]);
    Paragraph::new(status)
        .alignment(Alignment::Center)
        .render(layout.status, frame.buffer_mut());

    // Whole seconds left minus the part of the current second already gone.
    let limit = f64::from(view.time_limit.max(1));
    let ratio = ((f64::from(snap.time_remaining) - view.tick_progress) / limit).clamp(0.0, 1.0);
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(time_color).bg(theme.div_line))
        .render(layout.gauge, frame.buffer_mut());

    if let Some(round) = view.revealed.or(snap.round) {
        draw_grid(
            frame,
            view,
            round,
            layout.grid,
            view.revealed.is_some(),
        );
    }

    if let Some(toast) = view.toast {
        let color = if toast.positive {
            theme.time_ok
        } else {
            theme.time_low
        };
        Paragraph::new(Line::from(Span::styled(
            toast.text.as_str(),
            Style::default().fg(color),
        )))
        .alignment(Alignment::Center)
        .render(layout.toast, frame.buffer_mut());
    }

    Paragraph::new(Line::from(Span::styled(
        "←↓↑→/hjkl Move   Enter Pick   Click Pick   E End   Q Quit",
        Style::default().fg(theme.inactive_fg),
    )))
    .alignment(Alignment::Center)
    .render(layout.hints, frame.buffer_mut());
}

fn draw_grid(frame: &mut Frame, view: &View<'_>, round: &Round, area: Rect, revealing: bool) {
    let Some(geom) = GridGeometry::fit(area, round.dimension()) else {
        draw_too_small(frame, view.theme, round.dimension(), area);
        return;
    };
    let frame_area = frame.area();
    let buf = frame.buffer_mut();
    let cursor = view.cursor.index(round.dimension());
    for tile in round.tiles() {
        let rect = geom.tile_rect(tile.id).intersection(area);
        buf.set_style(rect, Style::default().bg(tile_color(tile.color)));

        let marker = if revealing && tile.is_target {
            Some("✓")
        } else if !revealing && tile.id == cursor {
            Some("◆")
        } else {
            None
        };
        if let Some(marker) = marker {
            let cx = rect.x + rect.width / 2;
            let cy = rect.y + rect.height / 2;
            if rect.width > 0 && rect.height > 0 && frame_area.contains(Position::new(cx, cy)) {
                let style = Style::default()
                    .fg(view.theme.cursor)
                    .bg(tile_color(tile.color))
                    .add_modifier(Modifier::BOLD);
                buf.set_string(cx, cy, marker, style);
            }
        }
    }
}

/// Shown instead of a grid that would be clipped; the countdown is frozen meanwhile.
fn draw_too_small(frame: &mut Frame, theme: &Theme, dimension: usize, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            " Terminal too small ",
            Style::default().fg(Color::White).bg(theme.time_low),
        )),
        Line::from(Span::styled(
            format!("A {dimension}x{dimension} grid needs at least {dimension} rows here."),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            "Enlarge the window to continue; the clock is paused.",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    let top = area.y + area.height.saturating_sub(3) / 2;
    let notice = Rect::new(area.x, top, area.width, area.height.min(3)).intersection(area);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(notice, frame.buffer_mut());
}

fn apply_reveal_effect(
    frame: &mut Frame,
    view: &View<'_>,
    round: &Round,
    area: Rect,
    reveal_effect: &mut Option<Effect>,
    reveal_process_time: &mut Option<Instant>,
) {
    let grid_area = playing_layout(area).grid;
    let Some(geom) = GridGeometry::fit(grid_area, round.dimension()) else {
        return;
    };
    let bounds = geom.bounds().intersection(grid_area);
    let delta = reveal_process_time
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *reveal_process_time = Some(view.now);

    if reveal_effect.is_none() {
        let target = geom.tile_rect(round.target_index());
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            !target.contains(pos)
        }));
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (REVEAL_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(bounds);
        *reveal_effect = Some(effect);
    }

    if let Some(effect) = reveal_effect {
        frame.render_effect(effect, bounds, TfxDuration::from_millis(delta_ms));
    }
}

/// "1m 05s" style play time.
pub fn format_play_time(secs: u64) -> String {
    format!("{}m {:02}s", secs / 60, secs % 60)
}

fn draw_result(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let Some(GameResult {
        final_stage,
        total_elapsed_secs,
        final_score,
        reason,
    }) = view.snapshot.last_result
    else {
        outer_block(theme).render(area, frame.buffer_mut());
        return;
    };
    let headline = match reason {
        EndReason::TimeUp => " Time's up! ",
        EndReason::Penalty => " Out of time! ",
        EndReason::Quit => " Game Over ",
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            headline,
            Style::default().fg(Color::White).bg(theme.time_low),
        )),
        Line::from(""),
        Line::from(Span::styled(
            final_score.to_string(),
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("Total score", Style::default().fg(theme.inactive_fg))),
        Line::from(""),
        Line::from(Span::styled(format!(" Stage reached: {final_stage} "), fg)),
        Line::from(Span::styled(
            format!(" Play time: {} ", format_play_time(total_elapsed_secs)),
            fg,
        )),
        Line::from(""),
        Line::from(Span::styled(" R — Restart    Q — Quit ", fg)),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(outer_block(theme))
        .render(area, frame.buffer_mut());
}
