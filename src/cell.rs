//! The character cell: the POD value type that makes up every
//! position in a `Screen`'s grid and every line in a `HistoryStore`.

#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};

use bitflags::bitflags;

use crate::color::CharacterColor;

bitflags! {
    #[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
    #[derive(Default)]
    pub struct Rendition: u16 {
        const BOLD          = 1 << 0;
        const ITALIC        = 1 << 1;
        const UNDERLINE     = 1 << 2;
        const BLINK         = 1 << 3;
        const REVERSE       = 1 << 4;
        const STRIKETHROUGH = 1 << 5;
        const INVISIBLE     = 1 << 6;
        /// `code` is a hash into the owning `ExtendedCharTable`
        /// rather than a literal code point.
        const EXTENDED      = 1 << 7;
    }
}

/// One styled character position. `code` is either a Unicode scalar
/// value (when `rendition` does not contain `EXTENDED`) or a 32-bit
/// hash key into an `ExtendedCharTable` (when it does). Cells are
/// plain old data: equality is componentwise and there is no drop
/// glue, which is what lets `Screen` and `HistoryStore` copy them by
/// value freely.
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Cell {
    pub code: u32,
    pub rendition: Rendition,
    pub foreground: CharacterColor,
    pub background: CharacterColor,
}

impl Default for Cell {
    fn default() -> Cell {
        Cell {
            code: ' ' as u32,
            rendition: Rendition::empty(),
            foreground: CharacterColor::Foreground,
            background: CharacterColor::Background,
        }
    }
}

impl Cell {
    pub fn from_char(c: char) -> Cell {
        Cell {
            code: c as u32,
            ..Cell::default()
        }
    }

    /// True when `code` must be resolved through an `ExtendedCharTable`
    /// rather than interpreted as a Unicode scalar value directly.
    #[inline]
    pub fn is_extended(&self) -> bool {
        self.rendition.contains(Rendition::EXTENDED)
    }

    /// The plain-character form of this cell, or `None` when it is
    /// an extended (multi-codepoint) cell that requires table lookup.
    pub fn as_char(&self) -> Option<char> {
        if self.is_extended() {
            None
        } else {
            char::from_u32(self.code)
        }
    }
}

impl From<char> for Cell {
    fn from(c: char) -> Cell {
        Cell::from_char(c)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_cell_is_a_blank_space() {
        let cell = Cell::default();
        assert_eq!(cell.as_char(), Some(' '));
        assert!(!cell.is_extended());
    }

    #[test]
    fn rendition_bits_round_trip() {
        let mut r = Rendition::empty();
        r.insert(Rendition::BOLD);
        r.insert(Rendition::UNDERLINE);
        assert!(r.contains(Rendition::BOLD));
        assert!(r.contains(Rendition::UNDERLINE));
        assert!(!r.contains(Rendition::ITALIC));
    }

    #[test]
    fn extended_cell_has_no_plain_char() {
        let mut cell = Cell::from_char('x');
        cell.rendition.insert(Rendition::EXTENDED);
        cell.code = 12345;
        assert_eq!(cell.as_char(), None);
        assert!(cell.is_extended());
    }

    #[test]
    fn componentwise_equality() {
        let a = Cell::from_char('a');
        let mut b = Cell::from_char('a');
        assert_eq!(a, b);
        b.rendition.insert(Rendition::BOLD);
        assert_ne!(a, b);
    }
}
