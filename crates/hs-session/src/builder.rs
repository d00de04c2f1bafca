//! Fluent builder for constructing a [`SimulationSession`].

use std::sync::Arc;

use hs_agent::Behavior;
use hs_core::World;
use tracing::debug;

use crate::{SessionConfig, SessionResult, SimulationSession, Snapshot};

/// Fluent builder for [`SimulationSession`].
///
/// # Required inputs
///
/// - [`World`]: the snapshot every run starts from
/// - a [`Behavior`]: struct, closure, or an already shared `Arc<dyn Behavior>`
///
/// # Optional inputs (have defaults)
///
/// | Method        | Default                    |
/// |---------------|----------------------------|
/// | `.config(c)`  | `SessionConfig::default()` |
///
/// # Example
///
/// ```rust,ignore
/// let session = SessionBuilder::new(World::demo(), WallFollower)
///     .config(SessionConfig { playing: true, ..Default::default() })
///     .build()?;
/// ```
pub struct SessionBuilder {
    world:    World,
    behavior: Arc<dyn Behavior>,
    config:   SessionConfig,
}

impl SessionBuilder {
    pub fn new(world: World, behavior: impl Behavior) -> Self {
        Self::shared(world, Arc::new(behavior))
    }

    /// Like [`new`][Self::new] for a behavior that is already type-erased.
    pub fn shared(world: World, behavior: Arc<dyn Behavior>) -> Self {
        Self { world, behavior, config: SessionConfig::default() }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Re-check the world's invariants and spawn the first run, parked at
    /// its start handshake.
    pub fn build(self) -> SessionResult<SimulationSession> {
        // `World` fields are public, so the start may have been edited since
        // `World::new` validated it.
        let world = World::new(self.world.grid, self.world.hamster)?;
        debug!(
            width = world.grid.width(),
            height = world.grid.height(),
            start = %world.hamster.position,
            behavior = self.behavior.name(),
            "building session"
        );
        SimulationSession::start(Snapshot::capture(&world), self.behavior, self.config)
    }
}
