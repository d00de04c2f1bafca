//! A behavior that only ever waits.

use crate::{Agent, AgentResult, Behavior};

/// Spends every step standing still.
///
/// Useful as a placeholder in tests, or to inspect a map without the
/// hamster moving.
pub struct IdleBehavior;

impl Behavior for IdleBehavior {
    fn run(&self, agent: &Agent) -> AgentResult<()> {
        loop {
            agent.wait()?;
        }
    }

    fn name(&self) -> &str {
        "idle"
    }
}
