//! Screen model, scrollback history and grapheme interning for a
//! terminal emulator: the part of the engine that turns decoded bytes
//! from a child process into a grid of styled cells, keeps the lines
//! that scroll off it, and publishes updates to one or more viewing
//! windows.
//!
//! The escape-sequence parser that drives `Screen`'s operations,
//! keyboard translator table loading, color scheme loading, glyph
//! rendering and process/pty I/O all live outside this crate; see
//! each module's doc comment for the boundary it presents instead.

pub mod cell;
pub mod color;
pub mod config;
pub mod emulation;
pub mod error;
pub mod extended_char_table;
pub mod history;
pub mod input;
pub mod line;
pub mod screen;
pub mod selection;
pub mod window;

pub use cell::{Cell, Rendition};
pub use color::{CharacterColor, ColorPalette, RgbColor};
pub use config::{Config, TerminalConfiguration};
pub use emulation::{CursorShape, Emulation, EmulationObserver, EmulationState};
pub use error::TermCoreError;
pub use extended_char_table::ExtendedCharTable;
pub use history::{HistoryConfig, HistoryStore};
pub use input::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
pub use line::Line;
pub use screen::Screen;
pub use selection::{SelectionCoordinate, SelectionRange};
pub use window::ScreenWindow;
