//! One behavior run: the worker body and the handle the session keeps.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hs_agent::{Abort, Agent, AgentResult, Behavior, FatalError};
use hs_core::{RunId, World};
use hs_gate::StepGate;
use tracing::{debug, warn};

use crate::{SessionError, SessionResult};

// ── RunOutcome ────────────────────────────────────────────────────────────────

/// How a behavior run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The routine returned normally.
    Completed,
    /// A fatal action (or a panic) terminated the routine.
    Failed(FatalError),
    /// Reset, shutdown, or the routine giving up with `Abort::Cancelled`.
    /// Never reported to the user.
    Cancelled,
}

impl RunOutcome {
    /// `true` for outcomes the driver passes to the observer.
    pub fn is_reported(&self) -> bool {
        !matches!(self, RunOutcome::Cancelled)
    }
}

// ── Worker body ───────────────────────────────────────────────────────────────

/// Execute `behavior` for one run and classify how it ended.
///
/// Parks at a start handshake first, so nothing happens before the driver
/// grants the first step.  With `repeat`, the routine is invoked again on the
/// same world each time it returns; a pass that performed no action waits
/// for one step before the next pass.
///
/// A fault recorded by an action takes precedence over whatever the routine
/// returned, so a behavior that swallows a fatal error is still reported as
/// failed.  Panics are caught and reported as [`FatalError::Panicked`].
pub fn run_behavior(behavior: &dyn Behavior, agent: &Agent, repeat: bool) -> RunOutcome {
    if agent.gate().handshake().is_err() {
        return RunOutcome::Cancelled;
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| run_passes(behavior, agent, repeat)));
    let outcome = match result {
        Ok(Ok(()))                  => RunOutcome::Completed,
        Ok(Err(Abort::Cancelled))   => RunOutcome::Cancelled,
        Ok(Err(Abort::Fatal(err)))  => RunOutcome::Failed(err),
        Err(payload) => RunOutcome::Failed(FatalError::Panicked(panic_message(payload.as_ref()))),
    };

    match agent.fault() {
        Some(fault) => RunOutcome::Failed(fault),
        None        => outcome,
    }
}

fn run_passes(behavior: &dyn Behavior, agent: &Agent, repeat: bool) -> AgentResult<()> {
    loop {
        let before = agent.gate().steps_granted();
        behavior.run(agent)?;
        if !repeat {
            return Ok(());
        }
        if agent.gate().steps_granted() == before {
            agent.gate().handshake()?;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ── ActiveRun ─────────────────────────────────────────────────────────────────

/// The session's side of one spawned run.
///
/// Dropping it cancels the gate, so a forgotten run never stays parked.
pub(crate) struct ActiveRun {
    pub(crate) id:    RunId,
    pub(crate) world: Arc<Mutex<World>>,
    pub(crate) gate:  StepGate,
    outcome: Arc<Mutex<Option<RunOutcome>>>,
    handle:  Option<JoinHandle<()>>,
}

impl ActiveRun {
    /// Spawn a worker thread executing `behavior` on its own copy of `world`.
    pub(crate) fn spawn(
        id:       RunId,
        world:    World,
        behavior: Arc<dyn Behavior>,
        repeat:   bool,
    ) -> SessionResult<Self> {
        let world = Arc::new(Mutex::new(world));
        let gate = StepGate::new();
        let outcome = Arc::new(Mutex::new(None));

        let agent = Agent::new(Arc::clone(&world), gate.clone());
        let slot = Arc::clone(&outcome);
        let name = behavior.name().to_owned();

        let handle = thread::Builder::new()
            .name(format!("hamster-run-{}", id.0))
            .spawn(move || {
                let result = run_behavior(behavior.as_ref(), &agent, repeat);
                debug!(%id, ?result, "run finished");
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                agent.gate().finish();
            })
            .map_err(SessionError::Spawn)?;

        debug!(%id, behavior = %name, repeat, "run spawned");
        Ok(Self { id, world, gate, outcome, handle: Some(handle) })
    }

    /// The run's outcome, once, after the worker has finished.
    pub(crate) fn take_outcome(&mut self) -> Option<RunOutcome> {
        if !self.gate.is_finished() {
            return None;
        }
        self.join();
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Cancel the run and wait up to `timeout` for the worker to exit.
    ///
    /// A worker stuck in a query-only loop never sees the cancellation; it is
    /// detached and left to run against its discarded world.
    pub(crate) fn stop(&mut self, timeout: Duration) {
        self.gate.cancel();
        if self.gate.wait_finished(timeout) {
            self.join();
        } else {
            warn!(id = %self.id, ?timeout, "run did not exit after cancel; detaching");
            self.handle = None;
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(id = %self.id, "run thread panicked outside the behavior");
            }
        }
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.gate.cancel();
    }
}
