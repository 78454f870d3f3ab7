//! A scrollable viewport over `(history ⧺ live grid)`. Grounded in
//! `original_source/lib/Screen.h`'s `ScreenWindow` (a thin, non-owning
//! window that tracks a scroll position and gets "notify" calls when
//! its screen's content changes) and, for the weak-reference wiring,
//! `wezterm-term`'s pattern of non-owning handles into engine state.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::line::Line;
use crate::screen::Screen;
use crate::selection::SelectionRange;

#[derive(Debug)]
pub struct ScreenWindow {
    screen: Weak<RefCell<Screen>>,
    window_lines: usize,
    scroll_line: usize,
    selection: Option<SelectionRange>,
    dirty: bool,
}

impl ScreenWindow {
    pub fn new(window_lines: usize) -> Rc<RefCell<ScreenWindow>> {
        Rc::new(RefCell::new(ScreenWindow {
            screen: Weak::new(),
            window_lines: window_lines.max(1),
            scroll_line: 0,
            selection: None,
            dirty: true,
        }))
    }

    /// Non-owning accessor used by `ExtendedCharTable::cleanup_unused`
    /// to enumerate the screen this window currently looks at.
    pub fn screen(&self) -> Option<Rc<RefCell<Screen>>> {
        self.screen.upgrade()
    }

    /// Re-binds this window to `screen`, scrolling to the end. Called
    /// by `Emulation::set_screen` on every window when the current
    /// screen index changes, so all windows are re-bound atomically.
    pub fn set_screen(&mut self, screen: &Rc<RefCell<Screen>>) {
        self.screen = Rc::downgrade(screen);
        self.scroll_to_end();
        self.dirty = true;
    }

    pub fn window_lines(&self) -> usize {
        self.window_lines
    }

    pub fn set_window_lines(&mut self, window_lines: usize) {
        self.window_lines = window_lines.max(1);
        self.clamp_scroll();
    }

    fn max_scroll_line(&self) -> usize {
        let Some(screen) = self.screen.upgrade() else {
            return 0;
        };
        let count = screen.borrow().document_line_count();
        count.saturating_sub(self.window_lines)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_line = self.scroll_line.min(self.max_scroll_line());
    }

    pub fn scroll_position(&self) -> usize {
        self.scroll_line
    }

    /// Sets the scroll position in document space, clamped to
    /// `[0, lineCount - windowLines]`.
    pub fn set_scroll_position(&mut self, line: usize) {
        self.scroll_line = line.min(self.max_scroll_line());
        self.dirty = true;
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let current = self.scroll_line as i64;
        let next = (current + delta).max(0) as usize;
        self.set_scroll_position(next);
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll_line = self.max_scroll_line();
        self.dirty = true;
    }

    pub fn set_selection(&mut self, range: Option<SelectionRange>) {
        self.selection = range;
        self.dirty = true;
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    /// Invalidates cached data and marks the window for re-publish;
    /// a display layer polls `take_dirty` and redraws when true.
    pub fn notify_output_changed(&mut self) {
        self.dirty = true;
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// The visible lines, document-space row `scroll_line` first.
    /// Returns fewer than `window_lines` only if the underlying
    /// screen has fewer lines than the viewport height (e.g. just
    /// after construction).
    pub fn visible_lines(&self) -> Vec<Line> {
        let Some(screen) = self.screen.upgrade() else {
            return Vec::new();
        };
        let screen = screen.borrow();
        let total = screen.document_line_count();
        let end = (self.scroll_line + self.window_lines).min(total);
        (self.scroll_line..end).map(|row| screen.read_document_line(row)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::extended_char_table::ExtendedCharTable;
    use crate::history::HistoryConfig;

    fn make_screen(width: usize, height: usize) -> Rc<RefCell<Screen>> {
        let table = ExtendedCharTable::new();
        Rc::new(RefCell::new(
            Screen::new(width, height, table, Some(HistoryConfig::Bounded { max_lines: 100 })).unwrap(),
        ))
    }

    #[test]
    fn freshly_bound_window_scrolls_to_end() {
        let screen = make_screen(5, 10);
        let window = ScreenWindow::new(4);
        window.borrow_mut().set_screen(&screen);
        assert_eq!(window.borrow().scroll_position(), 6);
    }

    #[test]
    fn scroll_position_is_clamped_to_available_lines() {
        let screen = make_screen(5, 10);
        let window = ScreenWindow::new(4);
        window.borrow_mut().set_screen(&screen);
        window.borrow_mut().set_scroll_position(1000);
        assert_eq!(window.borrow().scroll_position(), 6);
        window.borrow_mut().set_scroll_position(0);
        window.borrow_mut().scroll_by(-50);
        assert_eq!(window.borrow().scroll_position(), 0);
    }

    #[test]
    fn screen_accessor_upgrades_weak_reference() {
        let screen = make_screen(5, 10);
        let window = ScreenWindow::new(4);
        assert!(window.borrow().screen().is_none());
        window.borrow_mut().set_screen(&screen);
        assert!(window.borrow().screen().is_some());
    }

    #[test]
    fn notify_output_changed_sets_and_take_dirty_clears() {
        let window = ScreenWindow::new(4);
        assert!(window.borrow_mut().take_dirty());
        assert!(!window.borrow_mut().take_dirty());
        window.borrow_mut().notify_output_changed();
        assert!(window.borrow_mut().take_dirty());
    }

    #[test]
    fn visible_lines_reads_from_the_bound_screen() {
        let screen = make_screen(3, 2);
        screen.borrow_mut().display_character('a');
        let window = ScreenWindow::new(2);
        window.borrow_mut().set_screen(&screen);
        let lines = window.borrow().visible_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].cell(0).as_char(), Some('a'));
    }
}
