//! Ready-made behaviors for the demo and for tests.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{Agent, AgentResult, Behavior};

// ── WallFollower ──────────────────────────────────────────────────────────────

/// Keeps its left paw on the wall and eats whatever it walks over.
///
/// Each pass: turn left, turn right until the way is free, step forward,
/// and take one piece of food if the new tile has any.
pub struct WallFollower;

impl WallFollower {
    /// One pass of the routine.
    pub fn step(agent: &Agent) -> AgentResult<()> {
        agent.turn_left()?;
        while !agent.is_free() {
            agent.turn_right()?;
        }
        agent.forward()?;
        if agent.count_food_here() > 0 {
            debug!(position = %agent.position(), "mhhm");
            agent.take_food()?;
        }
        Ok(())
    }
}

impl Behavior for WallFollower {
    fn run(&self, agent: &Agent) -> AgentResult<()> {
        loop {
            Self::step(agent)?;
        }
    }

    fn name(&self) -> &str {
        "wall-follower"
    }
}

// ── RandomWalk ────────────────────────────────────────────────────────────────

/// Wanders at random, never walking into walls, eating as it goes.
///
/// Every run re-seeds from `seed`, so a reset replays the exact same walk.
pub struct RandomWalk {
    pub seed: u64,
}

impl RandomWalk {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Behavior for RandomWalk {
    fn run(&self, agent: &Agent) -> AgentResult<()> {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        loop {
            match rng.gen_range(0..4u8) {
                0 => agent.turn_left()?,
                1 => agent.turn_right()?,
                _ if agent.is_free() => agent.forward()?,
                _ => agent.turn_right()?,
            }
            if agent.count_food_here() > 0 {
                agent.take_food()?;
            }
        }
    }

    fn name(&self) -> &str {
        "random-walk"
    }
}
