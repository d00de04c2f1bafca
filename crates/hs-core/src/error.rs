//! World-model error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where construction can fail on bad input.

use thiserror::Error;

use crate::Position;

/// The error type for grid construction, loading and lookups.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cell ({col}, {row}) is outside the {width}x{height} grid")]
    OutOfBounds {
        col:    i32,
        row:    i32,
        width:  usize,
        height: usize,
    },

    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    #[error("row {row} has {got} cells, expected {expected}")]
    NotRectangular {
        row:      usize,
        expected: usize,
        got:      usize,
    },

    #[error("expected {expected} tiles, got {got}")]
    TileCount { expected: usize, got: usize },

    #[error("start position {0} is off the grid or on an obstacle")]
    InvalidStart(Position),

    #[error("map parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `hs-*` crates that surface `CoreError`.
pub type CoreResult<T> = Result<T, CoreError>;
