//! `hs-session` — runs one behavior against one world, a step at a time.
//!
//! # Lifecycle
//!
//! ```text
//! SessionBuilder::build
//!   └─ spawn run #1 ── parked at its start handshake
//!
//! loop (driver):
//!   ① Wait     — until the pacer's next deadline or a control command.
//!   ② Grant    — at most one step: a pending credit first, else play timing.
//!   ③ Settle   — wait until the behavior parks again (or finishes).
//!   ④ Observe  — hand the settled world to the observer.
//!   ⑤ Outcome  — a completed or failed run is reported, then reset.
//!
//! reset():
//!   cancel gate ─▶ old run unwinds via `Abort::Cancelled`
//!   restore snapshot ─▶ new gate ─▶ spawn run #n+1 (parked)
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`session`]  | `SimulationSession`, `TickReport`                          |
//! | [`snapshot`] | `Snapshot`, the initial world restored on every reset      |
//! | [`builder`]  | `SessionBuilder`                                           |
//! | [`config`]   | `SessionConfig`                                            |
//! | [`run`]      | `run_behavior`, `RunOutcome`                               |
//! | [`observer`] | `SessionObserver`, `NoopObserver`                          |
//! | [`driver`]   | `Driver`, `ControlHandle`, `Command`                       |
//! | [`error`]    | `SessionError`, `SessionResult`                            |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use hs_agent::WallFollower;
//! use hs_core::World;
//! use hs_session::{Driver, NoopObserver, SessionBuilder};
//!
//! let session = SessionBuilder::new(World::demo(), WallFollower).build()?;
//! let (driver, control) = Driver::new(session, NoopObserver);
//! std::thread::spawn(move || driver.run());
//! control.set_playing(true)?;
//! ```

pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod observer;
pub mod run;
pub mod session;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use builder::SessionBuilder;
pub use config::SessionConfig;
pub use driver::{Command, ControlHandle, Driver};
pub use error::{SessionError, SessionResult};
pub use observer::{NoopObserver, SessionObserver};
pub use run::{RunOutcome, run_behavior};
pub use session::{SimulationSession, TickReport};
pub use snapshot::Snapshot;
