//! Owns the two screens, dispatches decoded input, and coalesces
//! output notifications. Grounded in the dispatch/host-callback shape
//! of `wezterm-term`'s older `terminal.rs` (`Terminal::advance_bytes`
//! feeding a `TerminalHost`) and, for the zmodem scan and the two
//! coalescing timers, `original_source/lib/Emulation.cpp`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::TerminalConfiguration;
use crate::error::TermCoreError;
use crate::extended_char_table::ExtendedCharTable;
use crate::input::{KeyCode, KeyEvent, MouseEvent};
use crate::screen::Screen;
use crate::window::ScreenWindow;

const T1_COALESCE: Duration = Duration::from_millis(10);
const T2_COALESCE: Duration = Duration::from_millis(40);

/// `\x18` followed by `"B00"`. Detected by a literal byte scan run in
/// parallel with UTF-8 decoding, matching Konsole's approach: no
/// attempt is made to correlate the `0x18` with the decoded stream,
/// so a payload that legitimately contains these four bytes (e.g.
/// inside a different binary protocol) reports a false positive.
/// Accepted behavior, not a bug.
const ZMODEM_MARKER: &[u8] = b"\x18B00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationState {
    Normal,
    Activity,
    Bell,
    Silence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Block,
    Underline,
    Bar,
}

/// The boundary a host implements to receive `Emulation`'s signals.
/// Mirrors `wezterm-term`'s `TerminalHost` trait: a set of callbacks
/// passed in by reference rather than a Qt-style signal/slot bus.
/// Every method has a no-op default so a host only overrides what it
/// cares about.
pub trait EmulationObserver {
    fn on_state_set(&mut self, _state: EmulationState) {}
    fn on_output_changed(&mut self) {}
    fn on_image_size_changed(&mut self, _lines: usize, _cols: usize) {}
    fn on_program_uses_mouse_changed(&mut self, _enabled: bool) {}
    fn on_program_bracketed_paste_mode_changed(&mut self, _enabled: bool) {}
    fn on_cursor_changed(&mut self, _shape: CursorShape, _blinking: bool) {}
    fn on_title_changed(&mut self, _code: u32, _text: &str) {}
    fn on_zmodem_detected(&mut self) {}
    /// Bytes produced by input translation, destined for the
    /// pseudo-terminal writer.
    fn on_send_data(&mut self, _bytes: &[u8]) {}
}

/// Incremental UTF-8 decoder. A partial multibyte sequence trailing
/// at the end of one `decode` call is buffered and completed by the
/// next, rather than being replaced prematurely. This supersedes the
/// legacy per-byte decoder that re-emitted interrupted control bytes
/// verbatim: this batch decoder with replacement-character fallback
/// is authoritative.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> Vec<char> {
        self.pending.extend_from_slice(bytes);
        let mut out = Vec::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.extend(s.chars());
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if valid_up_to > 0 {
                        out.extend(std::str::from_utf8(&self.pending[..valid_up_to]).unwrap().chars());
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(0..valid_up_to + len);
                        }
                        None => {
                            self.pending.drain(0..valid_up_to);
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

pub struct Emulation {
    screens: [Rc<RefCell<Screen>>; 2],
    current: usize,
    windows: Vec<Rc<RefCell<ScreenWindow>>>,
    extended_chars: Rc<RefCell<ExtendedCharTable>>,
    decoder: Utf8Decoder,
    zmodem_tail: Vec<u8>,
    program_uses_mouse: bool,
    bracketed_paste_mode: bool,
    t1_deadline: Option<Instant>,
    t2_deadline: Option<Instant>,
}

impl Emulation {
    pub fn new(width: usize, height: usize, config: &dyn TerminalConfiguration) -> Result<Emulation, TermCoreError> {
        let extended_chars = ExtendedCharTable::new();
        let primary = Screen::new(width, height, extended_chars.clone(), Some(config.history_config()))?;
        let alternate = Screen::new(width, height, extended_chars.clone(), None)?;

        Ok(Emulation {
            screens: [Rc::new(RefCell::new(primary)), Rc::new(RefCell::new(alternate))],
            current: 0,
            windows: Vec::new(),
            extended_chars,
            decoder: Utf8Decoder::default(),
            zmodem_tail: Vec::new(),
            program_uses_mouse: false,
            bracketed_paste_mode: false,
            t1_deadline: None,
            t2_deadline: None,
        })
    }

    pub fn current_screen(&self) -> Rc<RefCell<Screen>> {
        Rc::clone(&self.screens[self.current])
    }

    pub fn screen(&self, index: usize) -> Rc<RefCell<Screen>> {
        Rc::clone(&self.screens[index])
    }

    pub fn current_screen_index(&self) -> usize {
        self.current
    }

    /// Idempotent; on a real transition, rebinds every window
    /// atomically. History stays attached to the primary screen only.
    pub fn set_screen(&mut self, index: usize) {
        let index = index.min(1);
        if index == self.current {
            return;
        }
        self.current = index;
        for window in &self.windows {
            window.borrow_mut().set_screen(&self.screens[index]);
        }
    }

    /// Creates a window bound to the current screen and registers it
    /// with the shared `ExtendedCharTable` for cleanup liveness
    /// enumeration, matching `Emulation::createWindow` in the
    /// original.
    pub fn create_window(&mut self, window_lines: usize) -> Rc<RefCell<ScreenWindow>> {
        let window = ScreenWindow::new(window_lines);
        window.borrow_mut().set_screen(&self.screens[self.current]);
        self.extended_chars.borrow_mut().register_window(&window);
        self.windows.push(Rc::clone(&window));
        window
    }

    pub fn set_image_size(&mut self, lines: usize, cols: usize, observer: &mut dyn EmulationObserver) {
        for screen in &self.screens {
            screen.borrow_mut().resize_image(lines, cols);
        }
        observer.on_image_size_changed(lines, cols);
    }

    pub fn image_size(&self) -> (usize, usize) {
        let screen = self.screens[self.current].borrow();
        (screen.height(), screen.width())
    }

    fn scan_for_zmodem(&mut self, bytes: &[u8], observer: &mut dyn EmulationObserver) {
        let mut buf = std::mem::take(&mut self.zmodem_tail);
        buf.extend_from_slice(bytes);
        if buf.windows(ZMODEM_MARKER.len()).any(|w| w == ZMODEM_MARKER) {
            observer.on_zmodem_detected();
        }
        let keep = (ZMODEM_MARKER.len() - 1).min(buf.len());
        self.zmodem_tail = buf[buf.len() - keep..].to_vec();
    }

    fn dispatch_char(&mut self, cp: char, observer: &mut dyn EmulationObserver) {
        let screen = Rc::clone(&self.screens[self.current]);
        match cp as u32 {
            0x08 => screen.borrow_mut().backspace(),
            0x09 => screen.borrow_mut().tab(),
            0x0A => screen.borrow_mut().new_line(),
            0x0D => screen.borrow_mut().to_start_of_line(),
            0x07 => observer.on_state_set(EmulationState::Bell),
            _ => screen.borrow_mut().display_character(cp),
        }
    }

    /// Decodes `bytes` as UTF-8 (buffering any trailing partial
    /// sequence for the next call) and dispatches each decoded code
    /// point to the current screen directly -- there is no
    /// escape-sequence parser interposed here. Also scans the raw
    /// bytes for the zmodem marker. Arms the coalescing deadlines but
    /// does not flush; the host drives `poll_flush`.
    pub fn receive_data(&mut self, bytes: &[u8], now: Instant, observer: &mut dyn EmulationObserver) {
        self.scan_for_zmodem(bytes, observer);
        let chars = self.decoder.decode(bytes);
        for cp in chars {
            self.dispatch_char(cp, observer);
        }
        self.note_activity(now);
    }

    /// Restarts T1 (always) and arms T2 only if it is not already
    /// armed: a fast-retry, guaranteed-flush coalescing scheme.
    fn note_activity(&mut self, now: Instant) {
        self.t1_deadline = Some(now + T1_COALESCE);
        if self.t2_deadline.is_none() {
            self.t2_deadline = Some(now + T2_COALESCE);
        }
    }

    /// The earliest instant the host should next call `poll_flush`,
    /// or `None` if neither timer is armed. There is no real event
    /// loop or spawned timer here; this is a pure deadline calculation
    /// the host schedules itself around.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.t1_deadline, self.t2_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Flushes and clears both deadlines if either has elapsed as of
    /// `now`, returning whether a flush occurred.
    pub fn poll_flush(&mut self, now: Instant, observer: &mut dyn EmulationObserver) -> bool {
        let due = self.t1_deadline.is_some_and(|d| now >= d) || self.t2_deadline.is_some_and(|d| now >= d);
        if due {
            self.flush(observer);
        }
        due
    }

    fn flush(&mut self, observer: &mut dyn EmulationObserver) {
        self.t1_deadline = None;
        self.t2_deadline = None;
        observer.on_output_changed();
    }

    pub fn set_program_uses_mouse(&mut self, enabled: bool, observer: &mut dyn EmulationObserver) {
        if self.program_uses_mouse != enabled {
            self.program_uses_mouse = enabled;
            observer.on_program_uses_mouse_changed(enabled);
        }
    }

    pub fn program_uses_mouse(&self) -> bool {
        self.program_uses_mouse
    }

    pub fn set_bracketed_paste_mode(&mut self, enabled: bool, observer: &mut dyn EmulationObserver) {
        if self.bracketed_paste_mode != enabled {
            self.bracketed_paste_mode = enabled;
            observer.on_program_bracketed_paste_mode_changed(enabled);
        }
    }

    pub fn bracketed_paste_mode(&self) -> bool {
        self.bracketed_paste_mode
    }

    /// A key event with text produces that text's UTF-8 bytes
    /// directly. Mapping keys with no text through a keyboard
    /// translator table is the job of a translator layer this crate
    /// doesn't implement; this only handles the direct-text case.
    pub fn send_key_event(&mut self, event: KeyEvent, observer: &mut dyn EmulationObserver) {
        if let KeyCode::Char(c) = event.key {
            let mut buf = [0u8; 4];
            let bytes = c.encode_utf8(&mut buf).as_bytes();
            observer.on_send_data(bytes);
        }
    }

    /// Mouse events are only meaningful to report once the program
    /// has requested mouse reporting; translating an accepted event
    /// into an escape sequence is the (out of scope) parser/encoder's
    /// job, so this just gates on that flag.
    pub fn should_report_mouse_event(&self, _event: &MouseEvent) -> bool {
        self.program_uses_mouse
    }
}
