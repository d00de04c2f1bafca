//! Session observer trait for rendering and progress reporting.

use hs_core::{RunId, World};

use crate::{RunOutcome, TickReport};

/// Callbacks invoked by [`Driver::run`][crate::Driver::run].
///
/// All methods have default no-op implementations.  `world` is always a
/// settled view: the behavior is parked, finished, or cancelled.
///
/// # Example: step counter
///
/// ```rust,ignore
/// struct Counter(u64);
///
/// impl SessionObserver for Counter {
///     fn on_frame(&mut self, report: &TickReport, _world: &World) {
///         if report.stepped {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait SessionObserver {
    /// Called after every granted step and after every reset.
    fn on_frame(&mut self, _report: &TickReport, _world: &World) {}

    /// Called when a run ends on its own (completed or failed).
    fn on_outcome(&mut self, _run: RunId, _outcome: &RunOutcome) {}

    /// Called once a fresh run has been spawned on a restored world.
    fn on_reset(&mut self, _run: RunId) {}
}

/// A [`SessionObserver`] that does nothing.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
