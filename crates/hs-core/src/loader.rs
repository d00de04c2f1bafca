//! Map-literal loader.
//!
//! # Format
//!
//! One CSV row per grid row, no header.  Each cell is either `X` (obstacle,
//! case-insensitive) or a non-negative integer food count:
//!
//! ```csv
//! X,X,X,X,X
//! X,0,3,0,X
//! X,0,X,1,X
//! X,X,X,X,X
//! ```
//!
//! Whitespace around cells is ignored, as are blank lines.  Every row must
//! have the same number of cells.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::{CoreError, CoreResult, Grid, Tile};

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a map literal held in memory.
pub fn parse_grid(text: &str) -> CoreResult<Grid> {
    load_grid_reader(text.as_bytes())
}

/// Load a map from a CSV file.
pub fn load_grid_csv(path: &Path) -> CoreResult<Grid> {
    let file = std::fs::File::open(path)?;
    let grid = load_grid_reader(file)?;
    debug!(path = %path.display(), width = grid.width(), height = grid.height(), "loaded map");
    Ok(grid)
}

/// Like [`load_grid_csv`] but accepts any `Read` source.
pub fn load_grid_reader<R: Read>(reader: R) -> CoreResult<Grid> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<Vec<Tile>> = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| CoreError::Parse(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = rows.len();
        let tiles = record
            .iter()
            .enumerate()
            .map(|(col, cell)| parse_tile(cell, row, col))
            .collect::<CoreResult<Vec<Tile>>>()?;
        rows.push(tiles);
    }

    Grid::from_rows(rows)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_tile(cell: &str, row: usize, col: usize) -> CoreResult<Tile> {
    if cell.eq_ignore_ascii_case("x") {
        return Ok(Tile::Obstacle);
    }
    cell.parse::<u32>().map(Tile::Food).map_err(|_| {
        CoreError::Parse(format!(
            "invalid cell {cell:?} at row {row}, column {col}: expected \"X\" or a food count"
        ))
    })
}
