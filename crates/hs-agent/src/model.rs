//! The `Behavior` trait: the extension point for user code.

use crate::{Agent, AgentResult};

/// A hamster behavior routine.
///
/// `run` is called on a worker thread with the run's [`Agent`].  It may loop
/// forever; the session stays responsive because every action is a point at
/// which a reset unwinds the routine via `?`.
///
/// Returning `Ok(())` ends the run as *completed* (or, with
/// `repeat_behavior`, starts the routine again on the same world).
///
/// # Thread safety
///
/// The same behavior value is shared by every run of a session (one per
/// reset), and a cancelled run may still be unwinding while the next one
/// starts, so implementations must be `Send + Sync`.  Per-run state belongs
/// in locals inside `run`.
///
/// # Example
///
/// ```rust,ignore
/// struct Spin;
///
/// impl Behavior for Spin {
///     fn run(&self, hamster: &Agent) -> AgentResult<()> {
///         loop {
///             hamster.turn_left()?;
///         }
///     }
/// }
/// ```
pub trait Behavior: Send + Sync + 'static {
    fn run(&self, agent: &Agent) -> AgentResult<()>;

    /// Short label for logs and status lines.
    fn name(&self) -> &str {
        "behavior"
    }
}

impl<F> Behavior for F
where
    F: Fn(&Agent) -> AgentResult<()> + Send + Sync + 'static,
{
    fn run(&self, agent: &Agent) -> AgentResult<()> {
        self(agent)
    }

    fn name(&self) -> &str {
        "closure"
    }
}
