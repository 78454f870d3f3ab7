//! Scrollback storage. Four variants share one narrow interface,
//! realized as a tagged `enum` rather than a `dyn` trait object, since
//! dispatch cost here is negligible next to the cell copies every
//! operation already performs.
//!
//! Grounded in `original_source/lib/History.h`'s `HistoryScroll`
//! class hierarchy (`HistoryScrollNone`, `HistoryScrollBuffer`,
//! `HistoryScrollFile`, `CompactHistoryScroll`).

mod bounded;
mod compact;
mod file;

use crate::cell::Cell;
use crate::error::TermCoreError;

pub use bounded::BoundedHistory;
pub use compact::CompactHistory;
pub use file::FileHistory;

/// Which storage strategy a `Screen`'s history uses. Mirrors
/// Konsole's `HistoryType` hierarchy (`HistoryTypeNone`,
/// `HistoryTypeBuffer`, `HistoryTypeFile`, `CompactHistoryType`).
#[derive(Debug, Clone, Copy)]
pub enum HistoryConfig {
    None,
    Bounded { max_lines: usize },
    File,
    Compact { max_lines: usize },
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig::Bounded { max_lines: 3500 }
    }
}

/// A uniform random-access read interface over append-only scrollback
/// writes; see each variant's module for its storage semantics.
#[derive(Debug)]
pub enum HistoryStore {
    None,
    Bounded(BoundedHistory),
    File(FileHistory),
    Compact(CompactHistory),
}

impl HistoryStore {
    pub fn new(config: HistoryConfig) -> Result<HistoryStore, TermCoreError> {
        Ok(match config {
            HistoryConfig::None => HistoryStore::None,
            HistoryConfig::Bounded { max_lines } => {
                HistoryStore::Bounded(BoundedHistory::new(max_lines))
            }
            HistoryConfig::File => HistoryStore::File(FileHistory::new()?),
            HistoryConfig::Compact { max_lines } => {
                HistoryStore::Compact(CompactHistory::new(max_lines))
            }
        })
    }

    pub fn has_scroll(&self) -> bool {
        !matches!(self, HistoryStore::None)
    }

    pub fn line_count(&self) -> usize {
        match self {
            HistoryStore::None => 0,
            HistoryStore::Bounded(h) => h.line_count(),
            HistoryStore::File(h) => h.line_count(),
            HistoryStore::Compact(h) => h.line_count(),
        }
    }

    /// Number of cells stored for history line `index`. Panics if
    /// `index` is out of range: reading an out-of-range index is a
    /// programming error, not a runtime condition to recover from.
    pub fn line_length(&self, index: usize) -> usize {
        match self {
            HistoryStore::None => panic!("HistoryStore::None has no lines"),
            HistoryStore::Bounded(h) => h.line_length(index),
            HistoryStore::File(h) => h.line_length(index),
            HistoryStore::Compact(h) => h.line_length(index),
        }
    }

    pub fn is_wrapped(&self, index: usize) -> bool {
        match self {
            HistoryStore::None => panic!("HistoryStore::None has no lines"),
            HistoryStore::Bounded(h) => h.is_wrapped(index),
            HistoryStore::File(h) => h.is_wrapped(index),
            HistoryStore::Compact(h) => h.is_wrapped(index),
        }
    }

    /// Reads up to `out.len()` cells from history line `index`
    /// starting at column `col`, returning the number actually
    /// written (clipped to the line's stored length).
    pub fn read_cells(&self, index: usize, col: usize, out: &mut [Cell]) -> usize {
        match self {
            HistoryStore::None => 0,
            HistoryStore::Bounded(h) => h.read_cells(index, col, out),
            HistoryStore::File(h) => h.read_cells(index, col, out),
            HistoryStore::Compact(h) => h.read_cells(index, col, out),
        }
    }

    /// Appends cells to the line currently being accumulated (not yet
    /// terminated by `append_line`).
    pub fn append_cells(&mut self, cells: &[Cell]) {
        match self {
            HistoryStore::None => {}
            HistoryStore::Bounded(h) => h.append_cells(cells),
            HistoryStore::File(h) => h.append_cells(cells),
            HistoryStore::Compact(h) => h.append_cells(cells),
        }
    }

    /// Terminates the line currently being accumulated, recording its
    /// wrap flag and making it readable at a new index.
    pub fn append_line(&mut self, wrapped: bool) {
        match self {
            HistoryStore::None => {}
            HistoryStore::Bounded(h) => h.append_line(wrapped),
            HistoryStore::File(h) => h.append_line(wrapped),
            HistoryStore::Compact(h) => h.append_line(wrapped),
        }
    }

    /// Convenience used by `Screen` when a whole line scrolls off at
    /// once: equivalent to `append_cells` followed by `append_line`.
    pub fn append_full_line(&mut self, cells: &[Cell], wrapped: bool) {
        self.append_cells(cells);
        self.append_line(wrapped);
    }

    /// The set of `EXTENDED` hashes referenced anywhere in this store.
    /// Used by `Screen::used_extended_chars` to build the liveness set
    /// `ExtendedCharTable::cleanup_unused` sweeps against. Implemented
    /// purely in terms of the public read interface so it works
    /// uniformly across variants.
    pub fn extended_hashes(&self) -> std::collections::HashSet<u32> {
        let mut set = std::collections::HashSet::new();
        for i in 0..self.line_count() {
            let len = self.line_length(i);
            let mut buf = vec![Cell::default(); len];
            self.read_cells(i, 0, &mut buf);
            for cell in &buf {
                if cell.is_extended() {
                    set.insert(cell.code);
                }
            }
        }
        set
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn line(s: &str) -> Vec<Cell> {
        s.chars().map(Cell::from_char).collect()
    }

    #[test]
    fn none_variant_discards_everything() {
        let mut h = HistoryStore::new(HistoryConfig::None).unwrap();
        assert!(!h.has_scroll());
        h.append_full_line(&line("hello"), false);
        assert_eq!(h.line_count(), 0);
    }

    #[test]
    fn appending_a_line_increases_count_by_one() {
        let mut h = HistoryStore::new(HistoryConfig::Bounded { max_lines: 10 }).unwrap();
        h.append_full_line(&line("abc"), false);
        assert_eq!(h.line_count(), 1);
        h.append_full_line(&line("def"), true);
        assert_eq!(h.line_count(), 2);
        assert!(!h.is_wrapped(0));
        assert!(h.is_wrapped(1));
    }

    #[test]
    fn wrap_flag_is_preserved_at_read_time() {
        let mut h = HistoryStore::new(HistoryConfig::Compact { max_lines: 10 }).unwrap();
        h.append_full_line(&line("x"), true);
        assert!(h.is_wrapped(0));
    }
}
