//! Unbounded, file-backed history. Grounded in `HistoryFile` and
//! `HistoryScrollFile` from `original_source/lib/History.h`: three
//! append-only logical files (`cells`, `index`, `lineflags`) and a
//! read/write-balance heuristic that mmaps a file once reads start to
//! dominate writes, unmapping again on the next write.

use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use memmap2::Mmap;

use crate::cell::Cell;
use crate::color::{CharacterColor, RgbColor};
use crate::error::TermCoreError;

/// Below this (very negative) read/write balance, a logical file maps
/// itself read-only for faster random access. Matches
/// `HistoryFile::MAP_THRESHOLD` in the original.
const MAP_THRESHOLD: i64 = -1000;

/// One append-only, randomly-readable temp file. Reused three times
/// by `FileHistory` for `cells`, `index` and `lineflags`, exactly as
/// the original `HistoryFile` class is.
#[derive(Debug)]
struct HistoryFileInner {
    file: File,
    length: u64,
    read_write_balance: i64,
    mmap: Option<Mmap>,
}

/// Read-path methods (`len`, `is_mapped`, `get`) take `&self`: the
/// mmap/balance bookkeeping they mutate is a caching heuristic, not
/// observable state, so it lives behind a `RefCell` to match the
/// shared `&self` read interface used by the other history variants.
#[derive(Debug)]
struct HistoryFile {
    inner: RefCell<HistoryFileInner>,
}

impl HistoryFile {
    fn new() -> Result<Self, TermCoreError> {
        let file = tempfile::tempfile().map_err(TermCoreError::HistoryFileInit)?;
        Ok(HistoryFile {
            inner: RefCell::new(HistoryFileInner {
                file,
                length: 0,
                read_write_balance: 0,
                mmap: None,
            }),
        })
    }

    fn len(&self) -> u64 {
        self.inner.borrow().length
    }

    fn is_mapped(&self) -> bool {
        self.inner.borrow().mmap.is_some()
    }

    fn map(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.mmap.is_some() || inner.length == 0 {
            return;
        }
        match unsafe { Mmap::map(&inner.file) } {
            Ok(mmap) => inner.mmap = Some(mmap),
            Err(err) => log::warn!("failed to mmap history file: {err}"),
        }
    }

    fn unmap(&self) {
        self.inner.borrow_mut().mmap = None;
    }

    fn add(&self, bytes: &[u8]) {
        if self.is_mapped() {
            self.unmap();
        }
        let mut inner = self.inner.borrow_mut();
        if let Err(err) = inner.file.seek(SeekFrom::End(0)) {
            log::warn!("history file seek failed: {err}");
            return;
        }
        if let Err(err) = inner.file.write_all(bytes) {
            log::warn!("history file write failed: {err}");
            return;
        }
        inner.length += bytes.len() as u64;
        inner.read_write_balance += 1;
    }

    /// Best-effort positional read. On I/O failure, `buf` is left
    /// zeroed, matching the "surfaced as a read of zero-length line"
    /// degraded-scrollback policy in the error handling design.
    fn get(&self, offset: u64, buf: &mut [u8]) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.read_write_balance -= 1;
        }
        if self.inner.borrow().read_write_balance <= MAP_THRESHOLD && !self.is_mapped() {
            self.map();
        }

        let mut inner = self.inner.borrow_mut();
        if let Some(mmap) = &inner.mmap {
            let start = offset as usize;
            let end = (start + buf.len()).min(mmap.len());
            if start < end {
                buf[..end - start].copy_from_slice(&mmap[start..end]);
            }
            return;
        }

        if inner.file.seek(SeekFrom::Start(offset)).is_err() {
            log::warn!("history file seek failed on read");
            return;
        }
        if inner.file.read_exact(buf).is_err() {
            log::warn!("history file read failed; returning degraded (zeroed) line");
        }
    }
}

const RECORD_SIZE: usize = 14;

fn encode_color(color: CharacterColor) -> [u8; 4] {
    match color {
        CharacterColor::Foreground => [0, 0, 0, 0],
        CharacterColor::Background => [1, 0, 0, 0],
        CharacterColor::PaletteIndex(idx) => [2, idx, 0, 0],
        CharacterColor::Rgb(rgb) => [3, rgb.red, rgb.green, rgb.blue],
    }
}

fn decode_color(bytes: [u8; 4]) -> CharacterColor {
    match bytes[0] {
        0 => CharacterColor::Foreground,
        1 => CharacterColor::Background,
        2 => CharacterColor::PaletteIndex(bytes[1]),
        _ => CharacterColor::Rgb(RgbColor::new(bytes[1], bytes[2], bytes[3])),
    }
}

fn encode_cell(cell: &Cell) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..4].copy_from_slice(&cell.code.to_le_bytes());
    buf[4..6].copy_from_slice(&cell.rendition.bits().to_le_bytes());
    buf[6..10].copy_from_slice(&encode_color(cell.foreground));
    buf[10..14].copy_from_slice(&encode_color(cell.background));
    buf
}

fn decode_cell(buf: &[u8]) -> Cell {
    let code = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let rendition_bits = u16::from_le_bytes(buf[4..6].try_into().unwrap());
    let fg = decode_color(buf[6..10].try_into().unwrap());
    let bg = decode_color(buf[10..14].try_into().unwrap());
    Cell {
        code,
        rendition: crate::cell::Rendition::from_bits_truncate(rendition_bits),
        foreground: fg,
        background: bg,
    }
}

#[derive(Debug)]
pub struct FileHistory {
    cells: HistoryFile,
    index: HistoryFile,
    lineflags: HistoryFile,
}

impl FileHistory {
    pub fn new() -> Result<Self, TermCoreError> {
        Ok(FileHistory {
            cells: HistoryFile::new()?,
            index: HistoryFile::new()?,
            lineflags: HistoryFile::new()?,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lineflags.len() as usize
    }

    fn start_of_line(&self, lineno: usize) -> u64 {
        if lineno == 0 {
            return 0;
        }
        let mut buf = [0u8; 8];
        self.index.get((lineno - 1) as u64 * 8, &mut buf);
        u64::from_le_bytes(buf)
    }

    pub fn line_length(&self, index: usize) -> usize {
        let start = self.start_of_line(index);
        let end = self.start_of_line(index + 1);
        ((end - start) as usize) / RECORD_SIZE
    }

    pub fn is_wrapped(&self, index: usize) -> bool {
        let mut buf = [0u8; 1];
        self.lineflags.get(index as u64, &mut buf);
        buf[0] != 0
    }

    pub fn read_cells(&self, index: usize, col: usize, out: &mut [Cell]) -> usize {
        let line_len = self.line_length(index);
        if col >= line_len {
            return 0;
        }
        let n = out.len().min(line_len - col);
        let start = self.start_of_line(index) + (col * RECORD_SIZE) as u64;
        let mut raw = vec![0u8; n * RECORD_SIZE];
        self.cells.get(start, &mut raw);
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = decode_cell(&raw[i * RECORD_SIZE..(i + 1) * RECORD_SIZE]);
        }
        n
    }

    pub fn append_cells(&mut self, cells: &[Cell]) {
        let mut raw = Vec::with_capacity(cells.len() * RECORD_SIZE);
        for cell in cells {
            raw.extend_from_slice(&encode_cell(cell));
        }
        self.cells.add(&raw);
    }

    pub fn append_line(&mut self, wrapped: bool) {
        let offset = self.cells.len();
        self.index.add(&offset.to_le_bytes());
        self.lineflags.add(&[wrapped as u8]);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn line(s: &str) -> Vec<Cell> {
        s.chars().map(Cell::from_char).collect()
    }

    #[test]
    fn round_trips_cells_through_the_backing_files() {
        let mut h = FileHistory::new().unwrap();
        h.append_cells(&line("hello"));
        h.append_line(false);
        assert_eq!(h.line_count(), 1);
        assert_eq!(h.line_length(0), 5);
        let mut out = [Cell::default(); 5];
        let n = h.read_cells(0, 0, &mut out);
        assert_eq!(n, 5);
        let s: String = out.iter().filter_map(|c| c.as_char()).collect();
        assert_eq!(s, "hello");
    }

    #[test]
    fn wrap_flag_is_preserved() {
        let mut h = FileHistory::new().unwrap();
        h.append_cells(&line("a"));
        h.append_line(true);
        h.append_cells(&line("b"));
        h.append_line(false);
        assert!(h.is_wrapped(0));
        assert!(!h.is_wrapped(1));
    }

    #[test]
    fn mapping_transitions_after_enough_reads() {
        let mut h = FileHistory::new().unwrap();
        for _ in 0..5 {
            h.append_cells(&line("X"));
            h.append_line(false);
        }
        assert!(!h.cells.is_mapped());
        let mut out = [Cell::default(); 1];
        for _ in 0..1100 {
            h.read_cells(0, 0, &mut out);
        }
        assert!(h.cells.is_mapped());

        // A further write unmaps it again.
        h.append_cells(&line("Y"));
        h.append_line(false);
        assert!(!h.cells.is_mapped());
    }

    #[test]
    fn many_lines_then_read_first() {
        let mut h = FileHistory::new().unwrap();
        for i in 0..2000 {
            h.append_cells(&line(&i.to_string()));
            h.append_line(false);
        }
        assert_eq!(h.line_count(), 2000);
        let mut out = [Cell::default(); 1];
        h.read_cells(0, 0, &mut out);
        assert_eq!(out[0].as_char(), Some('0'));
    }
}
