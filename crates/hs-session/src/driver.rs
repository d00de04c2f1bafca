//! Driver loop and the control handle that feeds it.
//!
//! The driver owns the [`SimulationSession`] on its own thread.  Controllers
//! (a terminal, a GUI, a test) hold cloneable [`ControlHandle`]s and send
//! [`Command`]s over a channel; the driver sleeps on that channel until the
//! next command or the pacer's next deadline, whichever comes first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Instant;

use hs_gate::StepRate;
use tracing::{debug, error, info};

use crate::{
    RunOutcome, SessionError, SessionObserver, SessionResult, SimulationSession, TickReport,
};

// ── Command ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Step,
    SetPlaying(bool),
    TogglePlaying,
    SetRate(StepRate),
    Faster(u8),
    Slower(u8),
    Reset,
    Shutdown,
}

// ── ControlHandle ─────────────────────────────────────────────────────────────

/// Cloneable sender side of a [`Driver`].
///
/// Every method fails with [`SessionError::Disconnected`] once the driver
/// has exited.  Dropping the last handle shuts the driver down.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    commands:      Sender<Command>,
    reset_pending: Arc<AtomicBool>,
}

impl ControlHandle {
    fn send(&self, command: Command) -> SessionResult<()> {
        self.commands.send(command).map_err(|_| SessionError::Disconnected)
    }

    /// Advance exactly one action.
    pub fn step(&self) -> SessionResult<()> {
        self.send(Command::Step)
    }

    pub fn set_playing(&self, playing: bool) -> SessionResult<()> {
        self.send(Command::SetPlaying(playing))
    }

    pub fn toggle_playing(&self) -> SessionResult<()> {
        self.send(Command::TogglePlaying)
    }

    pub fn set_rate(&self, rate: StepRate) -> SessionResult<()> {
        self.send(Command::SetRate(rate))
    }

    pub fn faster(&self, by: u8) -> SessionResult<()> {
        self.send(Command::Faster(by))
    }

    pub fn slower(&self, by: u8) -> SessionResult<()> {
        self.send(Command::Slower(by))
    }

    /// Request a reset.  Requests made before the driver gets to the first
    /// one collapse into a single reset.
    pub fn reset(&self) -> SessionResult<()> {
        if self.reset_pending.swap(true, Ordering::AcqRel) {
            debug!("reset already pending");
            return Ok(());
        }
        self.send(Command::Reset)
    }

    pub fn shutdown(&self) -> SessionResult<()> {
        self.send(Command::Shutdown)
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Runs a session: applies commands, ticks on time, feeds the observer.
pub struct Driver<O: SessionObserver> {
    session:       SimulationSession,
    observer:      O,
    commands:      Receiver<Command>,
    reset_pending: Arc<AtomicBool>,
}

impl<O: SessionObserver> Driver<O> {
    pub fn new(session: SimulationSession, observer: O) -> (Self, ControlHandle) {
        let (tx, rx) = mpsc::channel();
        let reset_pending = Arc::new(AtomicBool::new(false));
        let handle = ControlHandle { commands: tx, reset_pending: Arc::clone(&reset_pending) };
        let driver = Self { session, observer, commands: rx, reset_pending };
        (driver, handle)
    }

    pub fn session(&self) -> &SimulationSession {
        &self.session
    }

    /// Loop until [`Command::Shutdown`] or until every handle is dropped.
    ///
    /// Every run that ends on its own is followed by a reset.  Completed and
    /// failed runs are reported to the observer first.  Returns the observer once the session is shut down.
    pub fn run(mut self) -> SessionResult<O> {
        let first = self.idle_report();
        self.emit_frame(&first);

        loop {
            let now = Instant::now();
            let received = match self.session.next_deadline(now) {
                Some(deadline) => {
                    match self.commands.recv_timeout(deadline.saturating_duration_since(now)) {
                        Ok(command)                         => Some(command),
                        Err(RecvTimeoutError::Timeout)      => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match self.commands.recv() {
                    Ok(command) => Some(command),
                    Err(_)      => break,
                },
            };

            // One command per tick, so queued step requests each get a frame.
            if let Some(command) = received {
                if !self.apply(command)? {
                    break;
                }
            }

            let report = self.session.tick(Instant::now());
            if report.stepped {
                self.emit_frame(&report);
            }
            if let Some(outcome) = &report.outcome {
                self.finish_run(&report, outcome)?;
            }
        }

        debug!("driver stopping");
        self.session.shutdown();
        Ok(self.observer)
    }

    /// Apply one command.  Returns `false` on shutdown.
    fn apply(&mut self, command: Command) -> SessionResult<bool> {
        debug!(?command, "applying control command");
        match command {
            Command::Step               => self.session.request_single_step(),
            Command::SetPlaying(on)     => self.session.set_playing(on),
            Command::TogglePlaying      => {
                self.session.toggle_playing();
            }
            Command::SetRate(rate)      => self.session.set_rate(rate),
            Command::Faster(by)         => {
                let rate = self.session.rate().faster(by);
                self.session.set_rate(rate);
            }
            Command::Slower(by)         => {
                let rate = self.session.rate().slower(by);
                self.session.set_rate(rate);
            }
            Command::Reset              => {
                self.reset_pending.store(false, Ordering::Release);
                self.reset()?;
            }
            Command::Shutdown           => return Ok(false),
        }
        Ok(true)
    }

    /// Report how a run ended and start the next one.
    ///
    /// Reset and shutdown drop the old run before any tick can see it, so an
    /// outcome observed here always means the run ended on its own.  A run
    /// that cancelled itself restarts silently.
    fn finish_run(&mut self, report: &TickReport, outcome: &RunOutcome) -> SessionResult<()> {
        match outcome {
            RunOutcome::Failed(err) => error!(run = %report.run, step = report.step, %err, "run failed"),
            RunOutcome::Completed   => info!(run = %report.run, step = report.step, "run completed"),
            RunOutcome::Cancelled   => debug!(run = %report.run, "run cancelled itself"),
        }
        if outcome.is_reported() {
            self.observer.on_outcome(report.run, outcome);
        }
        self.reset()
    }

    fn reset(&mut self) -> SessionResult<()> {
        let run = self.session.reset()?;
        self.observer.on_reset(run);
        let report = self.idle_report();
        self.emit_frame(&report);
        Ok(())
    }

    fn idle_report(&self) -> TickReport {
        TickReport {
            run:     self.session.current_run().unwrap_or_default(),
            stepped: false,
            permit:  None,
            step:    self.session.steps(),
            outcome: None,
        }
    }

    fn emit_frame(&mut self, report: &TickReport) {
        let observer = &mut self.observer;
        self.session.with_world(|world| observer.on_frame(report, world));
    }
}
