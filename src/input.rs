//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    /// Pick the tile under the cursor (or confirm on menus).
    Select,
    /// End the running session.
    End,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Supports both normal (arrows, enter) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Char('e') => Action::End,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

/// Grid cursor in row-major coordinates, clamped to the current dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    /// Move one cell, wrapping around the edges of a `dimension`-wide grid.
    pub fn step(&mut self, action: Action, dimension: usize) {
        let dimension = dimension.max(1);
        self.clamp(dimension);
        match action {
            Action::Up => self.row = (self.row + dimension - 1) % dimension,
            Action::Down => self.row = (self.row + 1) % dimension,
            Action::Left => self.col = (self.col + dimension - 1) % dimension,
            Action::Right => self.col = (self.col + 1) % dimension,
            _ => {}
        }
    }

    pub fn clamp(&mut self, dimension: usize) {
        let last = dimension.max(1) - 1;
        self.row = self.row.min(last);
        self.col = self.col.min(last);
    }

    /// Tile index under the cursor.
    #[inline]
    pub fn index(&self, dimension: usize) -> usize {
        self.row * dimension + self.col
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrow_and_vim_keys() {
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Char('k'))), Action::Up);
        assert_eq!(key_to_action(key(KeyCode::Char('l'))), Action::Right);
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Select);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Select);
        assert_eq!(key_to_action(key(KeyCode::Char('e'))), Action::End);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('x'))), Action::None);
    }

    #[test]
    fn test_modifiers() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_c), Action::Quit);
        let alt_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(key_to_action(alt_h), Action::None);
        let shift_r = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(shift_r), Action::Restart);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut c = Cursor::default();
        c.step(Action::Up, 3);
        assert_eq!((c.row, c.col), (2, 0));
        c.step(Action::Left, 3);
        assert_eq!((c.row, c.col), (2, 2));
        c.step(Action::Right, 3);
        assert_eq!(c.index(3), 6);
    }

    #[test]
    fn test_cursor_clamps_when_grid_changes() {
        let mut c = Cursor { row: 4, col: 4 };
        c.clamp(2);
        assert_eq!(c, Cursor { row: 1, col: 1 });
        assert_eq!(c.index(2), 3);
    }
}
