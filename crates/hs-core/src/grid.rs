//! Tile grid.
//!
//! # Layout
//!
//! Tiles are stored row-major in a single `Vec`:
//!
//!   index = row * width + col
//!
//! The shape is fixed at construction; only per-cell food counts change
//! afterwards.  Coordinates outside the grid behave like obstacles for
//! [`Grid::is_obstacle`], so the world is implicitly walled and an agent can
//! never sense "off the edge" as free.

use std::fmt;

use crate::{CoreError, CoreResult, Position};

// ── Tile ──────────────────────────────────────────────────────────────────────

/// Contents of one grid cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tile {
    Obstacle,
    /// A walkable cell holding `count` pieces of food.
    Food(u32),
}

impl Tile {
    /// An empty walkable cell.
    pub const EMPTY: Tile = Tile::Food(0);

    #[inline]
    pub fn is_obstacle(self) -> bool {
        matches!(self, Tile::Obstacle)
    }

    /// Food count, or `None` for an obstacle.
    #[inline]
    pub fn food(self) -> Option<u32> {
        match self {
            Tile::Obstacle => None,
            Tile::Food(n)  => Some(n),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::EMPTY
    }
}

impl fmt::Display for Tile {
    /// Same spelling as the map literal: `X` or the food count.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tile::Obstacle => f.write_str("X"),
            Tile::Food(n)  => write!(f, "{n}"),
        }
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

/// A rectangular, fixed-shape tile map.
///
/// Deserialization goes through [`Grid::new`], so a decoded grid obeys the
/// same shape checks as one built in code.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawGrid"))]
pub struct Grid {
    width:  usize,
    height: usize,
    tiles:  Vec<Tile>,
}

/// Unchecked wire form of [`Grid`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawGrid {
    width:  usize,
    height: usize,
    tiles:  Vec<Tile>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawGrid> for Grid {
    type Error = CoreError;

    fn try_from(raw: RawGrid) -> CoreResult<Self> {
        Grid::new(raw.width, raw.height, raw.tiles)
    }
}

impl Grid {
    /// Build a grid from a flat row-major tile vector.
    pub fn new(width: usize, height: usize, tiles: Vec<Tile>) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::EmptyGrid);
        }
        if tiles.len() != width * height {
            return Err(CoreError::TileCount { expected: width * height, got: tiles.len() });
        }
        Ok(Self { width, height, tiles })
    }

    /// Build a grid from nested rows.  Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> CoreResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(CoreError::EmptyGrid);
        }

        let mut tiles = Vec::with_capacity(width * height);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != width {
                return Err(CoreError::NotRectangular { row, expected: width, got: cells.len() });
            }
            tiles.extend(cells);
        }
        Ok(Self { width, height, tiles })
    }

    /// The 8×9 demo map: a walled room with a few interior obstacles, a big
    /// pile of 90 food near the start and a single piece further in.
    ///
    /// Pair it with [`Grid::DEMO_START`] facing [`Heading::Down`][crate::Heading::Down].
    pub fn demo() -> Self {
        const X: Tile = Tile::Obstacle;
        const fn f(n: u32) -> Tile { Tile::Food(n) }
        let rows = vec![
            vec![X, X,     X,    X,    X,    X,    X,    X],
            vec![X, f(0),  f(90), f(0), f(0), f(0), f(0), X],
            vec![X, f(0),  f(0), f(1), f(0), X,    f(0), X],
            vec![X, f(0),  f(0), f(0), X,    X,    f(0), X],
            vec![X, X,     X,    f(0), f(0), f(0), f(0), X],
            vec![X, f(0),  f(0), f(0), f(0), f(0), f(0), X],
            vec![X, f(0),  f(0), f(0), f(0), f(0), f(0), X],
            vec![X, f(0),  f(0), f(0), f(0), f(0), f(0), X],
            vec![X, X,     X,    X,    X,    X,    X,    X],
        ];
        Self { width: 8, height: rows.len(), tiles: rows.concat() }
    }

    /// Start cell of the hamster in [`Grid::demo`].
    pub const DEMO_START: Position = Position::new(1, 1);

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `true` if `(col, row)` lies within the grid extent.
    #[inline]
    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height
    }

    #[inline]
    fn index(&self, col: i32, row: i32) -> Option<usize> {
        self.contains(col, row)
            .then(|| row as usize * self.width + col as usize)
    }

    /// The tile at `(col, row)`.
    pub fn tile_at(&self, col: i32, row: i32) -> CoreResult<Tile> {
        self.index(col, row)
            .map(|i| self.tiles[i])
            .ok_or(CoreError::OutOfBounds { col, row, width: self.width, height: self.height })
    }

    /// Shorthand for [`tile_at`][Self::tile_at] with a [`Position`].
    #[inline]
    pub fn tile(&self, pos: Position) -> CoreResult<Tile> {
        self.tile_at(pos.col, pos.row)
    }

    /// `true` for obstacle tiles **and** for any out-of-bounds coordinate.
    pub fn is_obstacle(&self, col: i32, row: i32) -> bool {
        self.index(col, row)
            .is_none_or(|i| self.tiles[i].is_obstacle())
    }

    /// Remove up to `n` food from `(col, row)` and return how much was taken.
    ///
    /// Never drives a count below zero.  Obstacles and out-of-bounds cells
    /// yield nothing.
    pub fn take_food_at(&mut self, col: i32, row: i32, n: u32) -> u32 {
        let Some(i) = self.index(col, row) else { return 0 };
        match &mut self.tiles[i] {
            Tile::Obstacle => 0,
            Tile::Food(count) => {
                let taken = n.min(*count);
                *count -= taken;
                taken
            }
        }
    }

    /// Add `n` food to `(col, row)`.  No-op on obstacles and out of bounds.
    pub fn put_food_at(&mut self, col: i32, row: i32, n: u32) {
        let Some(i) = self.index(col, row) else { return };
        if let Tile::Food(count) = &mut self.tiles[i] {
            *count = count.saturating_add(n);
        }
    }

    /// Iterate rows top to bottom; each row is a slice of `width` tiles.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width)
    }

    /// Sum of all food lying on the grid.
    pub fn total_food(&self) -> u64 {
        self.tiles.iter().filter_map(|t| t.food()).map(u64::from).sum()
    }
}

impl fmt::Display for Grid {
    /// Renders the grid back into map-literal form, one row per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(Tile::to_string).collect();
            writeln!(f, "{}", line.join(","))?;
        }
        Ok(())
    }
}
