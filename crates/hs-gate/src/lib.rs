//! `hs-gate` — the step gate: how straight-line behavior code is advanced one
//! visible step at a time.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                       |
//! |-----------|----------------------------------------------------------------|
//! | [`gate`]  | `StepGate` (single-slot rendezvous), `GatePhase`               |
//! | [`pacer`] | `Pacer` (play mode, step credits, next deadline), `Permit`     |
//! | [`rate`]  | `StepRate`: control value → inter-step delay                   |
//! | [`error`] | `Cancelled`                                                    |
//!
//! # Handshake protocol (summary)
//!
//! ```text
//! behavior thread                     driver thread
//! ───────────────                     ─────────────
//! action: check cancelled
//!         mutate world
//!         phase = AwaitingPermission ─▶ pacer.ready(now)?  ─▶ gate.grant()
//!         block on condvar                                   phase = Granted
//!         ◀──────────────────────────────────────────────────┘
//!         phase = Idle, return                   gate.wait_settled(..)
//!         ... user code ...                      render
//! ```
//!
//! `cancel()` flips the phase to `Cancelled` from any state; the blocked
//! handshake wakes and returns [`Cancelled`], and every later handshake fails
//! immediately.

pub mod error;
pub mod gate;
pub mod pacer;
pub mod rate;


pub use error::Cancelled;
pub use gate::{GatePhase, StepGate};
pub use pacer::{Pacer, Permit};
pub use rate::StepRate;
