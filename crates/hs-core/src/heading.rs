//! Compass headings and grid positions.
//!
//! Positions are signed so that "the cell ahead" of an edge cell is still a
//! representable value; [`Grid`][crate::Grid] then rejects it as out of
//! bounds instead of the arithmetic wrapping or saturating.

use std::fmt;

// ── Heading ───────────────────────────────────────────────────────────────────

/// One of the four cardinal directions, cyclically ordered
/// `Up → Right → Down → Left → Up`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Heading {
    Up,
    Right,
    #[default]
    Down,
    Left,
}

impl Heading {
    /// All headings in clockwise order starting from `Up`.
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    /// Position of `self` in [`Heading::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Heading::Up    => 0,
            Heading::Right => 1,
            Heading::Down  => 2,
            Heading::Left  => 3,
        }
    }

    /// Heading at `i` in the clockwise cycle; wraps modulo 4.
    #[inline]
    pub fn from_index(i: usize) -> Heading {
        Self::ALL[i % 4]
    }

    /// Quarter turn counter-clockwise (previous in the cycle).
    #[inline]
    pub fn turned_left(self) -> Heading {
        Self::from_index(self.index() + 3)
    }

    /// Quarter turn clockwise (next in the cycle).
    #[inline]
    pub fn turned_right(self) -> Heading {
        Self::from_index(self.index() + 1)
    }

    /// Unit vector `(dcol, drow)`.  Rows grow downwards.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up    => (0, -1),
            Heading::Right => (1, 0),
            Heading::Down  => (0, 1),
            Heading::Left  => (-1, 0),
        }
    }

    /// Single-character arrow used by text renderers.
    pub fn arrow(self) -> char {
        match self {
            Heading::Up    => '^',
            Heading::Right => '>',
            Heading::Down  => 'v',
            Heading::Left  => '<',
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Heading::Up    => "up",
            Heading::Right => "right",
            Heading::Down  => "down",
            Heading::Left  => "left",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Heading {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "n" | "north"    => Ok(Heading::Up),
            "right" | "e" | "east"  => Ok(Heading::Right),
            "down" | "s" | "south"  => Ok(Heading::Down),
            "left" | "w" | "west"   => Ok(Heading::Left),
            other => Err(format!("unknown heading {other:?}")),
        }
    }
}

// ── Position ──────────────────────────────────────────────────────────────────

/// A `(col, row)` cell coordinate.  `(0, 0)` is the top-left cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub col: i32,
    pub row: i32,
}

impl Position {
    #[inline]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// The neighbouring cell one step along `heading`.
    #[inline]
    pub fn step(self, heading: Heading) -> Position {
        let (dc, dr) = heading.delta();
        Position::new(self.col + dc, self.row + dr)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}
