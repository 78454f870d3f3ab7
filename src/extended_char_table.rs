//! Process-wide (or, in this crate's realization, per-`Emulation`)
//! interning table for multi-codepoint grapheme clusters.
//!
//! Grounded directly in `ExtendedCharTable` from
//! `original_source/lib/Emulation.cpp`: the rolling hash, the linear
//! probe, and the two-wraparound cleanup protocol are translated
//! line-for-line from that C++ implementation into the idiom this
//! crate otherwise uses (`HashMap`, `Weak` references, `log::warn!`
//! instead of `qWarning()`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use crate::window::ScreenWindow;

/// An interned grapheme cluster: one or more Unicode scalar values
/// that were composed into a single cell.
pub type ExtendedChar = Vec<char>;

#[derive(Debug, Default)]
pub struct ExtendedCharTable {
    table: HashMap<u32, ExtendedChar>,
    windows: Vec<Weak<RefCell<ScreenWindow>>>,
    warned_exhaustion: bool,
}

impl ExtendedCharTable {
    pub fn new() -> Rc<RefCell<ExtendedCharTable>> {
        Rc::new(RefCell::new(ExtendedCharTable::default()))
    }

    /// Registers a window for liveness enumeration during cleanup.
    /// Called by `Emulation::create_window`; mirrors
    /// `ExtendedCharTable::instance.windows << window` in
    /// `Emulation::createWindow`.
    pub(crate) fn register_window(&mut self, window: &Rc<RefCell<ScreenWindow>>) {
        self.windows.push(Rc::downgrade(window));
    }

    fn rolling_hash(codepoints: &[char]) -> u32 {
        let mut hash: u32 = 0;
        for &cp in codepoints {
            hash = hash.wrapping_mul(31).wrapping_add(cp as u32);
        }
        hash
    }

    /// Returns a stable nonzero key for `codepoints`, interning it if
    /// this is the first sighting. Returns `0` (a sentinel meaning
    /// "could not intern") if the hash space is exhausted twice in a
    /// single call; the caller must then fall back to a plain
    /// replacement character.
    pub fn intern(&mut self, codepoints: &[char]) -> u32 {
        debug_assert!(!codepoints.is_empty(), "intern() requires a nonempty sequence");

        let mut hash = Self::rolling_hash(codepoints);

        // `0` is reserved and never used as a live key.
        if hash == 0 {
            hash = 1;
        }
        let initial_hash = hash;
        let mut tried_cleanup = false;

        loop {
            match self.table.get(&hash) {
                Some(existing) if existing.as_slice() == codepoints => return hash,
                Some(_) => {
                    // Collision with a different sequence: linear probe.
                    hash = hash.wrapping_add(1);
                    if hash == 0 {
                        hash = 1;
                    }
                    if hash == initial_hash {
                        if !tried_cleanup {
                            tried_cleanup = true;
                            self.cleanup_unused();
                        } else {
                            if !self.warned_exhaustion {
                                log::warn!(
                                    "extended char table exhausted; falling back to a replacement character"
                                );
                                self.warned_exhaustion = true;
                            }
                            return 0;
                        }
                    }
                }
                None => {
                    self.table.insert(hash, codepoints.to_vec());
                    return hash;
                }
            }
        }
    }

    /// Returns the interned sequence for `hash`, or `None` if it is
    /// not (or no longer) present.
    pub fn lookup(&self, hash: u32) -> Option<&[char]> {
        self.table.get(&hash).map(|v| v.as_slice())
    }

    /// Deletes every entry not referenced by any live window's
    /// current screen. Mirrors the cleanup sweep performed the first
    /// time `createExtendedChar` wraps all the way around the hash
    /// space in `Emulation.cpp`.
    fn cleanup_unused(&mut self) {
        log::debug!("extended char table cleanup sweep starting, {} entries", self.table.len());

        let mut used: HashSet<u32> = HashSet::new();
        self.windows.retain(|w| w.strong_count() > 0);
        for window in &self.windows {
            if let Some(window) = window.upgrade() {
                if let Some(screen) = window.borrow().screen() {
                    used.extend(screen.borrow().used_extended_chars());
                }
            }
        }

        self.table.retain(|hash, _| used.contains(hash));
        log::debug!("extended char table cleanup sweep finished, {} entries remain", self.table.len());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn seq(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn intern_round_trips() {
        let mut table = ExtendedCharTable::default();
        let s = seq("e\u{0301}"); // e + combining acute
        let h1 = table.intern(&s);
        assert_ne!(h1, 0);
        assert_eq!(table.lookup(h1), Some(s.as_slice()));
    }

    #[test]
    fn interning_same_sequence_twice_returns_same_hash() {
        let mut table = ExtendedCharTable::default();
        let s = seq("e\u{0301}");
        let h1 = table.intern(&s);
        let h2 = table.intern(&s);
        assert_eq!(h1, h2);
    }

    #[test]
    fn distinct_sequences_get_distinct_hashes() {
        let mut table = ExtendedCharTable::default();
        let a = table.intern(&seq("e\u{0301}"));
        let b = table.intern(&seq("a\u{0301}"));
        assert_ne!(a, b);
    }

    #[test]
    fn lookup_of_absent_hash_is_none() {
        let table = ExtendedCharTable::default();
        assert_eq!(table.lookup(424242), None);
    }

    #[test]
    fn a_sequence_whose_raw_hash_is_zero_still_interns() {
        let mut table = ExtendedCharTable::default();
        let s = seq("\0"); // rolling_hash("\0") == 0 before the reserved-key remap
        let h = table.intern(&s);
        assert_ne!(h, 0);
        assert_eq!(table.lookup(h), Some(s.as_slice()));
        // Interning it again must take the same-key fast path rather than
        // treating the remapped hash as a fresh wraparound back to itself.
        assert_eq!(table.intern(&s), h);
    }

    #[test]
    fn cleanup_with_no_live_windows_removes_everything() {
        let mut table = ExtendedCharTable::default();
        table.intern(&seq("e\u{0301}"));
        table.intern(&seq("a\u{0301}"));
        assert_eq!(table.len(), 2);
        table.cleanup_unused();
        assert_eq!(table.len(), 0);
    }
}
