//! `hs-agent` — the hamster as seen by behavior code.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`agent`]   | `Agent`: sensing and action primitives over a shared `World`   |
//! | [`model`]   | `Behavior` trait (blanket impl for closures)                    |
//! | [`noop`]    | `IdleBehavior`, waits forever                                   |
//! | [`samples`] | `WallFollower`, `RandomWalk`                                    |
//! | [`error`]   | `FatalError`, `Abort`, `AgentResult<T>`                         |
//!
//! # Design notes
//!
//! Behavior code is written as plain straight-line Rust:
//!
//! ```rust,ignore
//! fn explore(hamster: &Agent) -> AgentResult<()> {
//!     loop {
//!         while !hamster.is_free() {
//!             hamster.turn_right()?;
//!         }
//!         hamster.forward()?;
//!     }
//! }
//! ```
//!
//! Every *action* (`forward`, turns, food transfers, `wait`) mutates the
//! world and then blocks in the run's [`StepGate`][hs_gate::StepGate] until
//! the driver grants the next step.  *Queries* (`is_free`,
//! `count_food_here`, …) never block, so sensing costs no time step.
//!
//! Actions return [`AgentResult`]; the `?` operator is how a run unwinds on
//! reset (`Abort::Cancelled`) or on a logic violation (`Abort::Fatal`).

pub mod agent;
pub mod error;
pub mod model;
pub mod noop;
pub mod samples;


pub use agent::Agent;
pub use error::{Abort, AgentResult, FatalError};
pub use model::Behavior;
pub use noop::IdleBehavior;
pub use samples::{RandomWalk, WallFollower};
