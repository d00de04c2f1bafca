use hs_core::{Heading, Position};
use hs_gate::Cancelled;
use thiserror::Error;

/// A logic violation that terminates the current run.
///
/// Reported to the controller as a failure; never clamped or corrected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("hamster at {at} facing {heading} ran into {target}")]
    Collision {
        at:      Position,
        heading: Heading,
        target:  Position,
    },

    #[error("cannot take {requested} food at {at}: only {available} there")]
    NotEnoughFood {
        at:        Position,
        requested: u32,
        available: u32,
    },

    #[error("cannot put down {requested} food: only carrying {carried}")]
    NotEnoughCarried {
        requested: u32,
        carried:   u32,
    },

    #[error("behavior panicked: {0}")]
    Panicked(String),
}

/// Why an action did not return normally.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Abort {
    /// Reset or shutdown; unwind quietly.
    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl From<Cancelled> for Abort {
    fn from(_: Cancelled) -> Self {
        Abort::Cancelled
    }
}

pub type AgentResult<T> = Result<T, Abort>;
