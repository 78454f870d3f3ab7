//! Keyboard and mouse input types. Grounded in `wezterm-term`'s
//! `input.rs` (its `MouseButton`/`MouseEvent`/`LastMouseClick`
//! click-streak tracker are kept close to the original), with
//! `KeyCode`/`KeyModifiers` made self-contained rather than
//! re-exported from `termwiz`, since the keyboard translator table
//! that would otherwise consume them is a boundary collaborator this
//! crate doesn't implement.

#![allow(clippy::suspicious_arithmetic_impl)]

use std::time::{Duration, Instant};

use bitflags::bitflags;

#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    #[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
    #[derive(Default)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// A logical key press, decoupled from any particular keyboard
/// layout. The escape-sequence/keyboard-translator layer (out of
/// scope here) maps these, together with `KeyModifiers` and terminal
/// mode flags, to the output byte sequence `Emulation::send_key_event`
/// writes to the child.
#[cfg_attr(feature = "use_serde", derive(Deserialize, Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Backspace,
    Tab,
    Enter,
    Escape,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    Function(u8),
}

#[cfg_attr(feature = "use_serde", derive(Deserialize, Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

#[cfg_attr(feature = "use_serde", derive(Deserialize, Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp(usize),
    WheelDown(usize),
    WheelLeft(usize),
    WheelRight(usize),
    None,
}

#[cfg_attr(feature = "use_serde", derive(Deserialize, Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Move,
}

#[cfg_attr(feature = "use_serde", derive(Deserialize, Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: usize,
    /// Row in the viewport's own coordinate space; negative values
    /// address scrollback above the viewport.
    pub y: i64,
    pub button: MouseButton,
    pub modifiers: KeyModifiers,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClickPosition {
    pub column: usize,
    pub row: i64,
}

/// Tracks the "click streak": the number of successive clicks of the
/// same button, at the same cell, within `CLICK_INTERVAL`. Used by a
/// host to distinguish single/double/triple click for word/line
/// selection; the core only maintains the counter.
#[derive(Debug, Clone)]
pub struct LastMouseClick {
    pub button: MouseButton,
    pub position: ClickPosition,
    time: Instant,
    pub streak: usize,
}

const CLICK_INTERVAL: u64 = 500;

impl LastMouseClick {
    pub fn new(button: MouseButton, position: ClickPosition) -> Self {
        Self {
            button,
            position,
            time: Instant::now(),
            streak: 1,
        }
    }

    pub fn add(&self, button: MouseButton, position: ClickPosition) -> Self {
        let now = Instant::now();
        let streak = if button == self.button
            && position.column == self.position.column
            && position.row == self.position.row
            && now.duration_since(self.time) <= Duration::from_millis(CLICK_INTERVAL)
        {
            self.streak + 1
        } else {
            1
        };
        Self {
            button,
            position,
            time: now,
            streak,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn repeated_click_at_same_cell_extends_the_streak() {
        let pos = ClickPosition { column: 3, row: 1 };
        let first = LastMouseClick::new(MouseButton::Left, pos);
        let second = first.add(MouseButton::Left, pos);
        assert_eq!(second.streak, 2);
    }

    #[test]
    fn click_at_a_different_cell_resets_the_streak() {
        let pos = ClickPosition { column: 3, row: 1 };
        let first = LastMouseClick::new(MouseButton::Left, pos);
        let elsewhere = ClickPosition { column: 4, row: 1 };
        let second = first.add(MouseButton::Left, elsewhere);
        assert_eq!(second.streak, 1);
    }

    #[test]
    fn different_button_resets_the_streak() {
        let pos = ClickPosition { column: 0, row: 0 };
        let first = LastMouseClick::new(MouseButton::Left, pos);
        let second = first.add(MouseButton::Right, pos);
        assert_eq!(second.streak, 1);
    }

    #[test]
    fn modifiers_bitflags_compose() {
        let m = KeyModifiers::SHIFT | KeyModifiers::CTRL;
        assert!(m.contains(KeyModifiers::SHIFT));
        assert!(m.contains(KeyModifiers::CTRL));
        assert!(!m.contains(KeyModifiers::ALT));
    }
}
