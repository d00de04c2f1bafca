//! `hs-core` — the grid-world data model for the hamster sandbox.
//!
//! This crate is a dependency of every other `hs-*` crate.  It has no `hs-*`
//! dependencies and knows nothing about threads or stepping: it only models
//! the world and enforces its invariants.
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`grid`]        | `Tile`, `Grid` (row-major, implicitly walled)         |
//! | [`heading`]     | `Heading` (cyclic compass), `Position`                |
//! | [`world`]       | `AgentState`, `World` (live grid + hamster)           |
//! | [`loader`]      | `parse_grid`, `load_grid_csv`, `load_grid_reader`     |
//! | [`ids`]         | `RunId`                                               |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod error;
pub mod grid;
pub mod heading;
pub mod ids;
pub mod loader;
pub mod world;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use grid::{Grid, Tile};
pub use heading::{Heading, Position};
pub use ids::RunId;
pub use loader::{load_grid_csv, load_grid_reader, parse_grid};
pub use world::{AgentState, World};
