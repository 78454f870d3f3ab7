//! Structured errors for the boundary operations that are allowed to fail.
//!
//! Per the error handling design, almost nothing in this crate returns
//! a `Result`: resource exhaustion and I/O failure are absorbed and
//! degrade gracefully (see `history::file` and `ExtendedCharTable::intern`).
//! The only public entry point that can genuinely fail is constructing a
//! file-backed history store, since that requires creating temp files.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TermCoreError {
    #[error("failed to initialize history temp file")]
    HistoryFileInit(#[source] std::io::Error),
}
