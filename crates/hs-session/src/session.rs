//! The `SimulationSession` struct and its step logic.

use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};

use hs_agent::Behavior;
use hs_core::{RunId, World};
use hs_gate::{Pacer, Permit, StepRate};
use tracing::{debug, trace, warn};

use crate::run::ActiveRun;
use crate::{RunOutcome, SessionConfig, SessionResult, Snapshot};

/// How often a driver re-checks a behavior that is busy between actions.
pub(crate) const BUSY_POLL: Duration = Duration::from_millis(50);

// ── TickReport ────────────────────────────────────────────────────────────────

/// What one call to [`SimulationSession::tick`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// The run the tick applied to.
    pub run: RunId,
    /// `true` if a step was granted (and the world may have changed).
    pub stepped: bool,
    /// Which permission the step used, if any.
    pub permit: Option<Permit>,
    /// Steps granted to this run so far.
    pub step: u64,
    /// Set exactly once per run, on the tick that observed its end.
    pub outcome: Option<RunOutcome>,
}

// ── SimulationSession ─────────────────────────────────────────────────────────

/// One world, one behavior, and the controls that pace it.
///
/// Owns the immutable snapshot, the current run (live world, gate, worker
/// thread) and the [`Pacer`].  Every method is called from the driver side;
/// the behavior only ever sees its [`Agent`][hs_agent::Agent].
///
/// Create via [`SessionBuilder`][crate::SessionBuilder].
pub struct SimulationSession {
    snapshot: Snapshot,
    behavior: Arc<dyn Behavior>,
    config:   SessionConfig,
    pacer:    Pacer,
    run:      Option<ActiveRun>,
    next_run: RunId,
}

impl SimulationSession {
    /// Take ownership of the snapshot and spawn the first run.
    pub(crate) fn start(
        snapshot: Snapshot,
        behavior: Arc<dyn Behavior>,
        config:   SessionConfig,
    ) -> SessionResult<Self> {
        let mut session = Self {
            pacer: Pacer::new(config.rate, config.playing),
            snapshot,
            behavior,
            config,
            run: None,
            next_run: RunId(1),
        };
        session.spawn_run()?;
        Ok(session)
    }

    fn spawn_run(&mut self) -> SessionResult<RunId> {
        let id = self.next_run;
        self.next_run = id.next();

        let run = ActiveRun::spawn(
            id,
            self.snapshot.restore(),
            Arc::clone(&self.behavior),
            self.config.repeat_behavior,
        )?;
        if !run.gate.wait_settled(self.config.settle_timeout) {
            warn!(%id, "new run did not reach its start handshake in time");
        }
        self.run = Some(run);
        Ok(id)
    }

    // ── Controls ──────────────────────────────────────────────────────────

    /// Abort the current run and start over from the snapshot.
    ///
    /// The old run is cancelled first, so it cannot mutate anything after
    /// this returns; its world is discarded.  Pending step credits are
    /// dropped; play mode and rate survive.  Returns the new run's id.
    pub fn reset(&mut self) -> SessionResult<RunId> {
        if let Some(mut run) = self.run.take() {
            debug!(id = %run.id, step = run.gate.steps_granted(), "resetting run");
            run.stop(self.config.settle_timeout);
        }
        self.pacer.clear_credits();
        self.spawn_run()
    }

    /// Queue exactly one step, whether playing or paused.
    pub fn request_single_step(&mut self) {
        self.pacer.request_step();
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.pacer.set_playing(playing);
    }

    /// Flip play/pause and return the new state.
    pub fn toggle_playing(&mut self) -> bool {
        let playing = !self.pacer.playing();
        self.pacer.set_playing(playing);
        playing
    }

    pub fn set_rate(&mut self, rate: StepRate) {
        self.pacer.set_rate(rate);
    }

    // ── Stepping ──────────────────────────────────────────────────────────

    /// Grant at most one step if the pacer allows it, wait for the behavior
    /// to settle, and collect the run's outcome if it just ended.
    ///
    /// A permit is only consumed when the behavior was actually parked; a
    /// request made while it is busy carries over to a later tick.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let timeout = self.config.settle_timeout;
        let Some(run) = self.run.as_mut() else {
            return TickReport {
                run:     RunId::default(),
                stepped: false,
                permit:  None,
                step:    0,
                outcome: None,
            };
        };

        let mut report = TickReport {
            run:     run.id,
            stepped: false,
            permit:  None,
            step:    run.gate.steps_granted(),
            outcome: None,
        };

        if let Some(permit) = self.pacer.ready(now) {
            if run.gate.grant() {
                self.pacer.consume(permit, now);
                if !run.gate.wait_settled(timeout) {
                    warn!(id = %run.id, ?timeout, "behavior still busy after grant");
                }
                // A fatal action cancels its own gate; let the worker store
                // its outcome before reporting.
                if run.gate.is_cancelled() {
                    run.gate.wait_finished(timeout);
                }
                report.stepped = true;
                report.permit = Some(permit);
                report.step = run.gate.steps_granted();
                trace!(id = %run.id, step = report.step, ?permit, "tick");
            }
        }

        report.outcome = run.take_outcome();
        report
    }

    /// When the driver should tick next, or `None` to wait for a command.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let due = self.pacer.next_deadline(now)?;
        match &self.run {
            Some(run) if !run.gate.is_awaiting() && !run.gate.is_finished() => {
                Some(due.max(now + BUSY_POLL))
            }
            _ => Some(due),
        }
    }

    // ── Inspection ────────────────────────────────────────────────────────

    /// A copy of the live world (the snapshot if no run is active).
    pub fn world(&self) -> World {
        self.with_world(World::clone)
    }

    /// Borrow the live world for the duration of `f`.
    pub fn with_world<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        match &self.run {
            Some(run) => f(&*run.world.lock().unwrap_or_else(PoisonError::into_inner)),
            None      => f(self.snapshot.world()),
        }
    }

    /// The initial world every run starts from.
    pub fn snapshot(&self) -> &World {
        self.snapshot.world()
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.run.as_ref().map(|run| run.id)
    }

    /// Steps granted to the current run.
    pub fn steps(&self) -> u64 {
        self.run.as_ref().map_or(0, |run| run.gate.steps_granted())
    }

    pub fn is_playing(&self) -> bool {
        self.pacer.playing()
    }

    pub fn rate(&self) -> StepRate {
        self.pacer.rate()
    }

    /// Pending single-step credits.
    pub fn pending_steps(&self) -> u32 {
        self.pacer.credits()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn behavior_name(&self) -> &str {
        self.behavior.name()
    }

    // ── Teardown ──────────────────────────────────────────────────────────

    /// Cancel the current run and wait (bounded) for its thread to exit.
    pub fn shutdown(&mut self) {
        if let Some(mut run) = self.run.take() {
            debug!(id = %run.id, "shutting down run");
            run.stop(self.config.settle_timeout);
        }
    }
}

impl Drop for SimulationSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
