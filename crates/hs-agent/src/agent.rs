//! The `Agent` handle passed to behavior code.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hs_core::{Heading, Position, Tile, World};
use hs_gate::StepGate;
use tracing::{debug, warn};

use crate::{Abort, AgentResult, FatalError};

/// The hamster, as seen by one behavior run.
///
/// Holds the run's shared [`World`] and its [`StepGate`].  A fresh `Agent`
/// is built for every run; after a reset the old handle keeps pointing at the
/// discarded world and a cancelled gate, so a stale worker can neither block
/// nor touch the new world.
///
/// # Queries vs. actions
///
/// | Query (no step)      | Action (one step)                             |
/// |----------------------|-----------------------------------------------|
/// | `is_free`            | `forward`, `turn_left`, `turn_right`          |
/// | `count_food_here`    | `take_food`, `take_food_n`                    |
/// | `heading`, `position`| `put_food`, `put_food_n`                      |
/// | `carried_food`       | `wait`                                        |
///
/// Queries never check for cancellation, so a loop that only queries cannot
/// be interrupted by a reset.
#[derive(Clone)]
pub struct Agent {
    world: Arc<Mutex<World>>,
    gate:  StepGate,
    fault: Arc<Mutex<Option<FatalError>>>,
}

impl Agent {
    pub fn new(world: Arc<Mutex<World>>, gate: StepGate) -> Self {
        Self { world, gate, fault: Arc::new(Mutex::new(None)) }
    }

    /// An agent over its own copy of `world` whose actions never wait.
    ///
    /// Useful for headless runs and for exercising behaviors in tests.
    pub fn detached(world: World) -> Self {
        Self::new(Arc::new(Mutex::new(world)), StepGate::free_running())
    }

    fn lock_world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the world under the gate lock, then park until the next step.
    ///
    /// A fatal outcome is recorded as the run's fault and closes the gate,
    /// so behavior code that swallows the error still cannot act again.
    fn act<T>(&self, mutate: impl FnOnce(&mut World) -> Result<T, FatalError>) -> AgentResult<T> {
        let result = self.gate.handshake_with(|| {
            let mut world = self.lock_world();
            mutate(&mut world).map_err(Abort::Fatal)
        });

        if let Err(Abort::Fatal(err)) = &result {
            debug!(%err, "fatal action");
            let mut fault = self.fault.lock().unwrap_or_else(PoisonError::into_inner);
            fault.get_or_insert_with(|| err.clone());
            drop(fault);
            self.gate.cancel();
        }
        result
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// `true` iff the cell ahead is on the grid and not an obstacle.
    pub fn is_free(&self) -> bool {
        self.lock_world().is_free_ahead()
    }

    /// Food lying on the hamster's current tile.
    pub fn count_food_here(&self) -> u32 {
        let world = self.lock_world();
        match world.tile_here() {
            Ok(Tile::Food(n)) => n,
            Ok(Tile::Obstacle) | Err(_) => {
                warn!(position = %world.hamster.position, "hamster tile holds no food count; treating as 0");
                0
            }
        }
    }

    pub fn heading(&self) -> Heading {
        self.lock_world().hamster.heading
    }

    pub fn position(&self) -> Position {
        self.lock_world().hamster.position
    }

    pub fn carried_food(&self) -> u32 {
        self.lock_world().hamster.carried_food
    }

    // ── Actions ───────────────────────────────────────────────────────────

    /// Step one cell ahead.  Running into an obstacle or the edge of the
    /// grid is fatal and leaves the position unchanged.
    pub fn forward(&self) -> AgentResult<()> {
        self.act(|world| {
            if world.move_forward() {
                Ok(())
            } else {
                Err(FatalError::Collision {
                    at:      world.hamster.position,
                    heading: world.hamster.heading,
                    target:  world.hamster.ahead(),
                })
            }
        })
    }

    pub fn turn_left(&self) -> AgentResult<()> {
        self.act(|world| {
            world.hamster.heading = world.hamster.heading.turned_left();
            Ok(())
        })
    }

    pub fn turn_right(&self) -> AgentResult<()> {
        self.act(|world| {
            world.hamster.heading = world.hamster.heading.turned_right();
            Ok(())
        })
    }

    /// Pick up one piece of food.
    pub fn take_food(&self) -> AgentResult<()> {
        self.take_food_n(1)
    }

    /// Pick up `n` pieces of food.  Asking for more than the tile holds is
    /// fatal and leaves the tile untouched.
    pub fn take_food_n(&self, n: u32) -> AgentResult<()> {
        self.act(|world| {
            let at = world.hamster.position;
            let available = world.tile_here().ok().and_then(Tile::food).unwrap_or(0);
            if n > available {
                return Err(FatalError::NotEnoughFood { at, requested: n, available });
            }
            let taken = world.grid.take_food_at(at.col, at.row, n);
            world.hamster.carried_food = world.hamster.carried_food.saturating_add(taken);
            Ok(())
        })
    }

    /// Put down one piece of food.
    pub fn put_food(&self) -> AgentResult<()> {
        self.put_food_n(1)
    }

    /// Put down `n` pieces of food.  Putting down more than is carried is
    /// fatal and changes nothing.
    pub fn put_food_n(&self, n: u32) -> AgentResult<()> {
        self.act(|world| {
            let carried = world.hamster.carried_food;
            if n > carried {
                return Err(FatalError::NotEnoughCarried { requested: n, carried });
            }
            let at = world.hamster.position;
            world.hamster.carried_food = carried - n;
            world.grid.put_food_at(at.col, at.row, n);
            Ok(())
        })
    }

    /// Spend one step doing nothing.
    pub fn wait(&self) -> AgentResult<()> {
        self.act(|_| Ok(()))
    }

    // ── Run bookkeeping ───────────────────────────────────────────────────

    /// The run's gate.  Owned by the session that spawned the run; behavior
    /// code sticks to the queries and actions above.
    #[doc(hidden)]
    pub fn gate(&self) -> &StepGate {
        &self.gate
    }

    /// The first fatal error raised by an action of this run, if any.
    pub fn fault(&self) -> Option<FatalError> {
        self.fault.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// A copy of the world this agent acts on.
    pub fn world(&self) -> World {
        self.lock_world().clone()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hamster = self.lock_world().hamster;
        f.debug_struct("Agent")
            .field("hamster", &hamster)
            .field("gate", &self.gate)
            .finish()
    }
}
