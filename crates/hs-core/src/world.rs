//! The live world: one [`Grid`] plus the hamster's [`AgentState`].

use crate::{CoreError, CoreResult, Grid, Heading, Position, Tile};

// ── AgentState ────────────────────────────────────────────────────────────────

/// Where the hamster is, which way it faces, and how much food it carries.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentState {
    pub position:     Position,
    pub heading:      Heading,
    pub carried_food: u32,
}

impl AgentState {
    /// A hamster at `position` facing `heading` with empty cheeks.
    pub fn new(position: Position, heading: Heading) -> Self {
        Self { position, heading, carried_food: 0 }
    }

    /// The cell directly in front of the hamster.
    #[inline]
    pub fn ahead(&self) -> Position {
        self.position.step(self.heading)
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// Grid and hamster state, owned together so the position invariant can be
/// checked in one place.
///
/// # Invariant
///
/// `hamster.position` is always inside the grid and never on an obstacle.
/// [`World::new`] rejects starts that violate it; [`World::move_forward`]
/// refuses moves that would.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct World {
    pub grid:    Grid,
    pub hamster: AgentState,
}

impl World {
    pub fn new(grid: Grid, hamster: AgentState) -> CoreResult<Self> {
        let pos = hamster.position;
        if grid.is_obstacle(pos.col, pos.row) {
            return Err(CoreError::InvalidStart(pos));
        }
        Ok(Self { grid, hamster })
    }

    /// The demo map with the hamster at its usual start, facing down.
    pub fn demo() -> Self {
        Self {
            grid:    Grid::demo(),
            hamster: AgentState::new(Grid::DEMO_START, Heading::Down),
        }
    }

    /// `true` if the cell ahead of the hamster is in bounds and walkable.
    #[inline]
    pub fn is_free_ahead(&self) -> bool {
        let ahead = self.hamster.ahead();
        !self.grid.is_obstacle(ahead.col, ahead.row)
    }

    /// Step one cell forward.  Returns `false` (leaving the world untouched)
    /// if the cell ahead is blocked or off the grid.
    pub fn move_forward(&mut self) -> bool {
        if !self.is_free_ahead() {
            return false;
        }
        self.hamster.position = self.hamster.ahead();
        true
    }

    /// The tile the hamster is standing on.
    pub fn tile_here(&self) -> CoreResult<Tile> {
        self.grid.tile(self.hamster.position)
    }
}
