//! The immutable starting world of a session.

use hs_core::World;

/// A deep copy of the initial [`World`], taken once when the session is
/// built.  Every run starts from its own [`restore`][Self::restore]d copy,
/// so nothing a run does can leak back into the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    world: World,
}

impl Snapshot {
    pub fn capture(world: &World) -> Self {
        Self { world: world.clone() }
    }

    /// A fresh, independent copy of the initial world.
    pub fn restore(&self) -> World {
        self.world.clone()
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}
