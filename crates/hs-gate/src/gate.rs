//! `StepGate`: single-slot rendezvous between a behavior run and its driver.
//!
//! # Phases
//!
//! ```text
//!            handshake            grant()            handshake returns
//!   Idle ──────────────▶ AwaitingPermission ──▶ Granted ──────────────▶ Idle
//!     │                        │
//!     └──── cancel() ──────────┴──────────▶ Cancelled   (terminal)
//! ```
//!
//! One gate serves exactly one run.  A reset cancels the old gate and builds
//! a new one, so a stale worker can never be released into the fresh world.
//!
//! # Locking
//!
//! The behavior side mutates the world inside
//! [`handshake_with`][StepGate::handshake_with] while holding the gate lock.
//! `cancel()` needs the same lock, so a cancelled run never mutates its world
//! afterwards.  Lock order everywhere: gate first, then world.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::trace;

use crate::Cancelled;

// ── GatePhase ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GatePhase {
    /// The behavior is running its own code between two actions (or has not
    /// reached its first handshake yet).
    Idle,
    /// The behavior is parked in a handshake, waiting for the driver.
    AwaitingPermission,
    /// The driver granted one step; the behavior has not woken up yet.
    Granted,
    /// Reset or shutdown.  Every handshake fails from now on.
    Cancelled,
}

// ── StepGate ──────────────────────────────────────────────────────────────────

struct GateState {
    phase:         GatePhase,
    /// Set once the behavior thread has returned (normally or not).
    finished:      bool,
    /// Grant every handshake immediately instead of waiting for the driver.
    free_running:  bool,
    steps_granted: u64,
}

impl GateState {
    /// The driver may observe the world: the behavior is parked or done.
    fn is_settled(&self) -> bool {
        self.finished || matches!(self.phase, GatePhase::AwaitingPermission | GatePhase::Cancelled)
    }
}

struct GateInner {
    state:   Mutex<GateState>,
    changed: Condvar,
}

/// Cloneable handle to one run's rendezvous slot.
///
/// The behavior side calls [`handshake`][Self::handshake] /
/// [`handshake_with`][Self::handshake_with]; the driver side calls
/// [`grant`][Self::grant], [`cancel`][Self::cancel] and
/// [`wait_settled`][Self::wait_settled].
#[derive(Clone)]
pub struct StepGate {
    inner: Arc<GateInner>,
}

impl StepGate {
    /// A gate in `Idle` that parks every handshake until granted.
    pub fn new() -> Self {
        Self::with_mode(false)
    }

    /// A gate that grants every handshake on the spot.
    ///
    /// Cancellation is still honoured, so a headless batch run can be
    /// stopped the same way as a visualized one.
    pub fn free_running() -> Self {
        Self::with_mode(true)
    }

    fn with_mode(free_running: bool) -> Self {
        Self {
            inner: Arc::new(GateInner {
                state: Mutex::new(GateState {
                    phase: GatePhase::Idle,
                    finished: false,
                    free_running,
                    steps_granted: 0,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Behavior side ─────────────────────────────────────────────────────

    /// Park until the driver grants one step.
    pub fn handshake(&self) -> Result<(), Cancelled> {
        self.handshake_with(|| Ok::<(), Cancelled>(()))
    }

    /// Check for cancellation, run `mutate`, then park until granted.
    ///
    /// `mutate` runs with the gate lock held, so it is atomic with respect
    /// to [`cancel`][Self::cancel].  If it fails, the error is returned at
    /// once without parking: a failed action consumes no step.
    pub fn handshake_with<T, E, F>(&self, mutate: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<Cancelled>,
    {
        let mut state = self.lock();
        if state.phase == GatePhase::Cancelled {
            return Err(Cancelled.into());
        }

        let value = mutate()?;

        if state.free_running {
            state.steps_granted += 1;
            return Ok(value);
        }

        state.phase = GatePhase::AwaitingPermission;
        self.inner.changed.notify_all();

        let mut state = self
            .inner
            .changed
            .wait_while(state, |s| s.phase == GatePhase::AwaitingPermission)
            .unwrap_or_else(PoisonError::into_inner);

        match state.phase {
            GatePhase::Cancelled => Err(Cancelled.into()),
            _ => {
                state.phase = GatePhase::Idle;
                Ok(value)
            }
        }
    }

    /// Mark the run as finished.  Called once by the worker on its way out.
    pub fn finish(&self) {
        let mut state = self.lock();
        state.finished = true;
        self.inner.changed.notify_all();
    }

    // ── Driver side ───────────────────────────────────────────────────────

    /// Release a parked handshake by exactly one step.
    ///
    /// Returns `false` (and does nothing) unless the behavior is currently
    /// awaiting permission; a grant is never banked for later.
    pub fn grant(&self) -> bool {
        let mut state = self.lock();
        if state.phase != GatePhase::AwaitingPermission {
            return false;
        }
        state.phase = GatePhase::Granted;
        state.steps_granted += 1;
        trace!(step = state.steps_granted, "step granted");
        self.inner.changed.notify_all();
        true
    }

    /// Cancel the run.  A suspended handshake wakes and unwinds; later
    /// handshakes fail immediately.  Returns `false` if already cancelled.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.phase == GatePhase::Cancelled {
            return false;
        }
        state.phase = GatePhase::Cancelled;
        self.inner.changed.notify_all();
        true
    }

    /// Block until the behavior is parked again, finished, or cancelled.
    ///
    /// Returns `false` if `timeout` elapsed first, i.e. the behavior is busy in
    /// code that never reaches a handshake.
    pub fn wait_settled(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .inner
            .changed
            .wait_timeout_while(state, timeout, |s| !s.is_settled())
            .unwrap_or_else(PoisonError::into_inner);
        state.is_settled()
    }

    /// Block until the worker has called [`finish`][Self::finish].
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .inner
            .changed
            .wait_timeout_while(state, timeout, |s| !s.finished)
            .unwrap_or_else(PoisonError::into_inner);
        state.finished
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn phase(&self) -> GatePhase {
        self.lock().phase
    }

    pub fn is_awaiting(&self) -> bool {
        self.phase() == GatePhase::AwaitingPermission
    }

    pub fn is_cancelled(&self) -> bool {
        self.phase() == GatePhase::Cancelled
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Steps released so far (free-running gates count every handshake).
    pub fn steps_granted(&self) -> u64 {
        self.lock().steps_granted
    }
}

impl Default for StepGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StepGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("StepGate")
            .field("phase", &state.phase)
            .field("finished", &state.finished)
            .field("steps_granted", &state.steps_granted)
            .finish()
    }
}
