//! The 2-D cell grid: cursor, selection, scroll region and the bridge
//! to a `HistoryStore`. Grounded in `wezterm-term`'s `screen.rs` for
//! overall shape (a fixed-width `Line` store plus cursor/scroll-region
//! state), but scrollback is kept in a separate `HistoryStore` rather
//! than folded into the same deque, since the grid itself always
//! stays exactly `height` lines long.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::cell::{Cell, Rendition};
use crate::color::CharacterColor;
use crate::error::TermCoreError;
use crate::extended_char_table::ExtendedCharTable;
use crate::history::{HistoryConfig, HistoryStore};
use crate::line::Line;
use crate::selection::SelectionRange;

/// Default width of a tab stop, matching the original's fixed (not
/// user-configurable) tab handling for the core.
const TAB_WIDTH: usize = 8;

#[derive(Debug)]
pub struct Screen {
    width: usize,
    height: usize,
    grid: Vec<Line>,

    cursor_row: usize,
    cursor_col: usize,
    /// Set when the cursor sits one past the last column after a
    /// write; the next `display_character` wraps instead of
    /// overwriting column `width - 1` again. Mirrors the "deferred
    /// wrap" cursor behavior real terminals implement.
    pending_wrap: bool,
    saved_cursor: Option<(usize, usize)>,

    insert_mode: bool,
    origin_mode: bool,
    wrap_mode: bool,

    scroll_top: usize,
    scroll_bottom: usize,

    pen_rendition: Rendition,
    pen_foreground: CharacterColor,
    pen_background: CharacterColor,

    /// `Some` only for the primary screen: history is logically owned
    /// by the primary screen alone, never the alternate screen.
    history: Option<HistoryStore>,
    extended_chars: Rc<RefCell<ExtendedCharTable>>,

    selection: Option<SelectionRange>,
}

impl Screen {
    pub fn new(
        width: usize,
        height: usize,
        extended_chars: Rc<RefCell<ExtendedCharTable>>,
        history_config: Option<HistoryConfig>,
    ) -> Result<Screen, TermCoreError> {
        let width = width.max(1);
        let height = height.max(1);
        let history = history_config.map(HistoryStore::new).transpose()?;

        Ok(Screen {
            width,
            height,
            grid: (0..height).map(|_| Line::new(width)).collect(),
            cursor_row: 0,
            cursor_col: 0,
            pending_wrap: false,
            saved_cursor: None,
            insert_mode: false,
            origin_mode: false,
            wrap_mode: true,
            scroll_top: 0,
            scroll_bottom: height - 1,
            pen_rendition: Rendition::empty(),
            pen_foreground: CharacterColor::Foreground,
            pen_background: CharacterColor::Background,
            history,
            extended_chars,
            selection: None,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn set_cursor_position(&mut self, row: usize, col: usize) {
        self.cursor_row = row.min(self.height - 1);
        self.cursor_col = col.min(self.width.saturating_sub(1));
        self.pending_wrap = false;
    }

    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some((self.cursor_row, self.cursor_col));
    }

    pub fn restore_cursor(&mut self) {
        if let Some((row, col)) = self.saved_cursor {
            self.set_cursor_position(row, col);
        }
    }

    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        if top < bottom && bottom < self.height {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        }
    }

    pub fn set_wrap_mode(&mut self, enabled: bool) {
        self.wrap_mode = enabled;
    }

    pub fn set_insert_mode(&mut self, enabled: bool) {
        self.insert_mode = enabled;
    }

    pub fn set_origin_mode(&mut self, enabled: bool) {
        self.origin_mode = enabled;
    }

    pub fn set_pen(&mut self, rendition: Rendition, foreground: CharacterColor, background: CharacterColor) {
        self.pen_rendition = rendition;
        self.pen_foreground = foreground;
        self.pen_background = background;
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    pub fn history_line_count(&self) -> usize {
        self.history.as_ref().map_or(0, HistoryStore::line_count)
    }

    pub fn grid(&self) -> &[Line] {
        &self.grid
    }

    pub fn set_selection(&mut self, range: Option<SelectionRange>) {
        self.selection = range;
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    /// Resizes the grid. If dimensions are unchanged, this is a no-op.
    /// Otherwise resamples the grid preserving content where possible,
    /// reflowing wrapped lines if the new width differs, and clamps
    /// the cursor to the new bounds.
    ///
    /// Invalid (non-positive) dimensions are silently ignored.
    pub fn resize_image(&mut self, lines: usize, columns: usize) {
        if lines == 0 || columns == 0 {
            return;
        }
        if lines == self.height && columns == self.width {
            return;
        }

        if columns != self.width {
            self.reflow(columns);
        }

        if lines < self.height {
            let overflow = self.height - lines;
            let displaced: Vec<Line> = self.grid.drain(0..overflow).collect();
            if let Some(history) = &mut self.history {
                for line in displaced {
                    history.append_full_line(trimmed_cells(line.cells()), line.is_wrapped());
                }
            }
            self.cursor_row = self.cursor_row.saturating_sub(overflow);
        } else if lines > self.height {
            for _ in 0..(lines - self.height) {
                self.grid.push(Line::new(self.width));
            }
        }

        self.height = lines;
        self.width = columns;
        self.scroll_top = 0;
        self.scroll_bottom = self.height - 1;
        self.cursor_row = self.cursor_row.min(self.height - 1);
        self.cursor_col = self.cursor_col.min(self.width.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Reflows the live grid to `new_width` by joining runs of
    /// wrap-continued lines back into logical lines and re-splitting
    /// them at the new width. History is never rewrapped: lines that
    /// become narrower are not retroactively rewrapped once they've
    /// scrolled into history.
    fn reflow(&mut self, new_width: usize) {
        let mut logical_lines: Vec<Vec<Cell>> = Vec::new();
        let mut current: Vec<Cell> = Vec::new();
        for line in self.grid.drain(..) {
            let wrapped = line.is_wrapped();
            current.extend_from_slice(line.cells());
            if !wrapped {
                logical_lines.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            logical_lines.push(current);
        }

        let mut new_grid = Vec::new();
        for logical in logical_lines {
            if logical.is_empty() {
                new_grid.push(Line::new(new_width));
                continue;
            }
            let mut chunks = logical.chunks(new_width).peekable();
            while let Some(chunk) = chunks.next() {
                let mut cells = chunk.to_vec();
                cells.resize(new_width, Cell::default());
                let wrapped = chunks.peek().is_some();
                new_grid.push(Line::from_cells(cells, wrapped));
            }
        }
        self.grid = new_grid;
    }

    /// Advances past the bottom margin: scrolls the scroll region up
    /// by one line. When the region's top is row 0 on a screen that
    /// owns history (i.e. the primary, non-alternate screen), the
    /// displaced line is appended there.
    fn scroll_up_one(&mut self) {
        let displaced = self.grid.remove(self.scroll_top);
        self.grid.insert(self.scroll_bottom, Line::new(self.width));

        if self.scroll_top == 0 {
            if let Some(history) = &mut self.history {
                history.append_full_line(trimmed_cells(displaced.cells()), displaced.is_wrapped());
            }
        }
    }

    fn advance_line(&mut self) {
        if self.cursor_row == self.scroll_bottom {
            self.scroll_up_one();
        } else {
            self.cursor_row += 1;
        }
    }

    pub fn to_start_of_line(&mut self) {
        self.cursor_col = 0;
        self.pending_wrap = false;
    }

    pub fn new_line(&mut self) {
        self.advance_line();
        self.cursor_col = 0;
        self.pending_wrap = false;
    }

    pub fn tab(&mut self) {
        let next = ((self.cursor_col / TAB_WIDTH) + 1) * TAB_WIDTH;
        self.cursor_col = next.min(self.width - 1);
        self.pending_wrap = false;
    }

    pub fn backspace(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
            self.pending_wrap = false;
        }
    }

    fn pen_cell(&self, cp: char) -> Cell {
        Cell {
            code: cp as u32,
            rendition: self.pen_rendition,
            foreground: self.pen_foreground,
            background: self.pen_background,
        }
    }

    /// Writing past the right edge with wrap-mode on writes the next
    /// character at column 0 of the next line and marks the original
    /// line `wrapped = true`. With wrap-mode off, subsequent writes
    /// overwrite the last column.
    pub fn display_character(&mut self, cp: char) {
        if self.pending_wrap {
            if self.wrap_mode {
                self.grid[self.cursor_row].set_wrapped(true);
                self.advance_line();
                self.cursor_col = 0;
            }
            self.pending_wrap = false;
        }

        if self.insert_mode {
            let row = &mut self.grid[self.cursor_row];
            let cells = row.cells_mut();
            for i in (self.cursor_col + 1..cells.len()).rev() {
                cells[i] = cells[i - 1];
            }
        }

        let cell = self.pen_cell(cp);
        self.grid[self.cursor_row].set_cell(self.cursor_col, cell);

        if self.cursor_col + 1 >= self.width {
            self.pending_wrap = true;
        } else {
            self.cursor_col += 1;
        }
    }

    /// Interns the current-cell base plus the incoming combining
    /// mark(s) into the `ExtendedCharTable` and replaces the current
    /// cell's code with the resulting hash, setting the `EXTENDED`
    /// bit. "Current cell" is the one just written, i.e. immediately
    /// to the left of the cursor.
    pub fn compose(&mut self, marks: &[char]) {
        if marks.is_empty() {
            return;
        }
        let (row, col) = if self.cursor_col > 0 {
            (self.cursor_row, self.cursor_col - 1)
        } else {
            (self.cursor_row, 0)
        };

        let existing = self.grid[row].cell(col);
        let mut sequence: Vec<char> = if existing.is_extended() {
            self.extended_chars
                .borrow()
                .lookup(existing.code)
                .map(<[char]>::to_vec)
                .unwrap_or_default()
        } else {
            existing.as_char().into_iter().collect()
        };
        sequence.extend_from_slice(marks);

        let hash = self.extended_chars.borrow_mut().intern(&sequence);
        let mut cell = existing;
        if hash == 0 {
            // Hash space exhausted even after cleanup: fall back to a
            // plain replacement character rather than losing the base
            // glyph outright.
            cell.code = char::REPLACEMENT_CHARACTER as u32;
            cell.rendition.remove(Rendition::EXTENDED);
        } else {
            cell.code = hash;
            cell.rendition.insert(Rendition::EXTENDED);
        }
        self.grid[row].set_cell(col, cell);
    }

    /// The set of `EXTENDED` hashes referenced by any live cell in
    /// this screen's grid or history. Feeds `ExtendedCharTable`'s
    /// cleanup-sweep liveness check.
    pub fn used_extended_chars(&self) -> HashSet<u32> {
        let mut set: HashSet<u32> = self.grid.iter().flat_map(Line::extended_hashes).collect();
        if let Some(history) = &self.history {
            set.extend(history.extended_hashes());
        }
        set
    }

    /// Total addressable lines in document space: history lines
    /// followed by the live grid.
    pub fn document_line_count(&self) -> usize {
        self.history_line_count() + self.height
    }

    /// Reads line `row` in document space (0 = oldest history line,
    /// or row 0 of the grid when there is no history).
    pub fn read_document_line(&self, row: usize) -> Line {
        let hist_count = self.history_line_count();
        if row < hist_count {
            let history = self.history.as_ref().expect("hist_count > 0 implies Some");
            let len = history.line_length(row);
            let mut cells = vec![Cell::default(); len];
            history.read_cells(row, 0, &mut cells);
            Line::from_cells(cells, history.is_wrapped(row))
        } else {
            self.grid[row - hist_count].clone()
        }
    }

    /// Renders document-space rows `[start, end)` as plain text, one
    /// line per row joined by `\n` (used for copy-out). Extended cells
    /// are resolved through the `ExtendedCharTable`; trailing blanks
    /// on each row are trimmed.
    pub fn write_lines_to_stream(&self, start: usize, end: usize) -> String {
        let end = end.min(self.document_line_count());
        let table = self.extended_chars.borrow();
        let mut out = String::new();
        for row in start..end {
            if row > start {
                out.push('\n');
            }
            let line = self.read_document_line(row);
            let mut text = String::new();
            for cell in line.cells() {
                if cell.is_extended() {
                    if let Some(seq) = table.lookup(cell.code) {
                        text.extend(seq.iter());
                    }
                } else if let Some(c) = cell.as_char() {
                    text.push(c);
                }
            }
            out.push_str(text.trim_end_matches(' '));
        }
        out
    }
}

/// The grid always keeps lines at exactly `width` cells, padded with
/// `Cell::default()`; history stores lines at their actual written
/// length. Trims the trailing run of default cells before a line
/// scrolls or resizes into history.
fn trimmed_cells(cells: &[Cell]) -> &[Cell] {
    let len = cells
        .iter()
        .rposition(|c| *c != Cell::default())
        .map_or(0, |i| i + 1);
    &cells[..len]
}

#[cfg(test)]
mod test {
    use super::*;

    fn screen(width: usize, height: usize, with_history: bool) -> Screen {
        let table = ExtendedCharTable::new();
        let history = with_history.then_some(HistoryConfig::Bounded { max_lines: 100 });
        Screen::new(width, height, table, history).unwrap()
    }

    fn row_text(s: &Screen, row: usize) -> String {
        s.grid()[row].cells().iter().filter_map(Cell::as_char).collect()
    }

    #[test]
    fn display_character_writes_at_cursor_and_advances() {
        let mut s = screen(10, 3, false);
        s.display_character('a');
        s.display_character('b');
        assert_eq!(s.cursor_position(), (0, 2));
        assert_eq!(&row_text(&s, 0)[0..2], "ab");
    }

    #[test]
    fn wrap_mode_on_wraps_to_next_line() {
        let mut s = screen(3, 2, false);
        s.display_character('a');
        s.display_character('b');
        s.display_character('c');
        assert!(!s.grid()[0].is_wrapped());
        s.display_character('d');
        assert!(s.grid()[0].is_wrapped());
        assert_eq!(s.cursor_position(), (1, 1));
        assert_eq!(&row_text(&s, 1)[0..1], "d");
    }

    #[test]
    fn wrap_mode_off_overwrites_last_column() {
        let mut s = screen(3, 2, false);
        s.set_wrap_mode(false);
        s.display_character('a');
        s.display_character('b');
        s.display_character('c');
        s.display_character('d');
        assert_eq!(&row_text(&s, 0)[0..3], "abd");
        assert_eq!(s.cursor_position(), (0, 2));
    }

    #[test]
    fn scrolling_off_the_top_appends_to_history_when_present() {
        let mut s = screen(5, 2, true);
        s.set_cursor_position(1, 0);
        for c in "line1".chars() {
            s.display_character(c);
        }
        s.new_line();
        for c in "line2".chars() {
            s.display_character(c);
        }
        assert_eq!(s.history_line_count(), 1);
    }

    #[test]
    fn scrolled_history_line_is_trimmed_to_its_written_length() {
        let mut s = screen(80, 1, true);
        for _ in 0..100 {
            s.display_character('X');
            s.new_line();
        }
        assert_eq!(s.history_line_count(), 100);
        let line = s.read_document_line(0);
        assert_eq!(line.cells().len(), 1);
        assert_eq!(line.cells()[0].as_char(), Some('X'));
    }

    #[test]
    fn alternate_screen_has_no_history() {
        let mut s = screen(5, 1, false);
        s.new_line();
        s.new_line();
        assert_eq!(s.history_line_count(), 0);
        assert!(!s.has_history());
    }

    #[test]
    fn backspace_moves_cursor_left_but_not_past_zero() {
        let mut s = screen(5, 1, false);
        s.set_cursor_position(0, 2);
        s.backspace();
        assert_eq!(s.cursor_position(), (0, 1));
        s.backspace();
        s.backspace();
        assert_eq!(s.cursor_position(), (0, 0));
    }

    #[test]
    fn tab_advances_to_the_next_stop() {
        let mut s = screen(20, 1, false);
        s.tab();
        assert_eq!(s.cursor_position(), (0, 8));
        s.tab();
        assert_eq!(s.cursor_position(), (0, 16));
    }

    #[test]
    fn compose_interns_base_plus_combining_mark() {
        let mut s = screen(5, 1, false);
        s.display_character('e');
        s.compose(&['\u{0301}']);
        let cell = s.grid()[0].cell(0);
        assert!(cell.is_extended());
        let table = s.extended_chars.clone();
        let seq = table.borrow().lookup(cell.code).unwrap().to_vec();
        assert_eq!(seq, vec!['e', '\u{0301}']);
    }

    #[test]
    fn used_extended_chars_reports_grid_and_history() {
        let mut s = screen(2, 1, true);
        s.display_character('e');
        s.compose(&['\u{0301}']);
        let hash = s.grid()[0].cell(0).code;
        s.new_line();
        assert!(s.used_extended_chars().contains(&hash));
    }

    #[test]
    fn resize_narrower_reflows_wrapped_lines() {
        let mut s = screen(4, 2, false);
        for c in "abcd".chars() {
            s.display_character(c);
        }
        assert!(s.grid()[0].is_wrapped());
        s.resize_image(2, 2);
        assert_eq!(s.height(), 2);
        assert_eq!(s.width(), 2);
        assert_eq!(&row_text(&s, 0), "ab");
        assert_eq!(&row_text(&s, 1), "cd");
    }

    #[test]
    fn resize_with_unchanged_dimensions_is_a_no_op() {
        let mut s = screen(5, 3, false);
        s.display_character('x');
        s.resize_image(3, 5);
        assert_eq!(&row_text(&s, 0)[0..1], "x");
    }

    #[test]
    fn resizing_to_the_same_dimensions_twice_in_a_row_is_idempotent() {
        let mut s = screen(6, 3, false);
        for c in "hello".chars() {
            s.display_character(c);
        }
        s.resize_image(4, 5);
        let after_first: Vec<Line> = s.grid().to_vec();
        s.resize_image(4, 5);
        assert_eq!(s.grid(), after_first.as_slice());
    }

    #[test]
    fn invalid_resize_is_ignored() {
        let mut s = screen(5, 3, false);
        s.resize_image(0, 5);
        assert_eq!((s.width(), s.height()), (5, 3));
    }

    #[test]
    fn write_lines_to_stream_trims_trailing_blanks_and_joins_rows() {
        let mut s = screen(5, 2, false);
        for c in "hi".chars() {
            s.display_character(c);
        }
        s.new_line();
        for c in "yo".chars() {
            s.display_character(c);
        }
        assert_eq!(s.write_lines_to_stream(0, 2), "hi\nyo");
    }
}
