//! `Pacer` decides *when* the driver may grant the next step.
//!
//! Two sources of permission:
//!
//! - **Step credits**: one per single-step request, usable while paused or
//!   playing.  A credit is only spent when a grant actually happens, so a
//!   request made while the behavior is busy still advances exactly one
//!   action once it parks.
//! - **Play mode**: one permit each time the rate's delay has elapsed since
//!   the previous step.
//!
//! The pacer never talks to the gate itself; the session asks
//! [`ready`][Pacer::ready], grants, then reports back with
//! [`consume`][Pacer::consume].

use std::time::Instant;

use crate::StepRate;

/// Why a step may be granted now.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Permit {
    /// A pending single-step request.
    Credit,
    /// The play-mode delay has elapsed.
    Play,
}

#[derive(Clone, Debug)]
pub struct Pacer {
    playing: bool,
    rate:    StepRate,
    credits: u32,
    /// When the next play-mode step is due.  `None` = due immediately.
    next_play_at: Option<Instant>,
}

impl Pacer {
    pub fn new(rate: StepRate, playing: bool) -> Self {
        Self { playing, rate, credits: 0, next_play_at: None }
    }

    // ── Controls ──────────────────────────────────────────────────────────

    /// Queue one single-step credit.
    pub fn request_step(&mut self) {
        self.credits = self.credits.saturating_add(1);
    }

    /// Switch play mode.  Turning play on makes the first step due at once.
    pub fn set_playing(&mut self, playing: bool) {
        if playing && !self.playing {
            self.next_play_at = None;
        }
        self.playing = playing;
    }

    pub fn set_rate(&mut self, rate: StepRate) {
        self.rate = rate;
    }

    /// Drop all pending single-step requests.
    pub fn clear_credits(&mut self) {
        self.credits = 0;
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// The permit available at `now`, if any.  Credits win over play timing.
    pub fn ready(&self, now: Instant) -> Option<Permit> {
        if self.credits > 0 {
            return Some(Permit::Credit);
        }
        if self.playing && self.next_play_at.is_none_or(|due| now >= due) {
            return Some(Permit::Play);
        }
        None
    }

    /// Record that `permit` was used for a grant at `now`.
    pub fn consume(&mut self, permit: Permit, now: Instant) {
        if permit == Permit::Credit {
            self.credits = self.credits.saturating_sub(1);
        }
        self.next_play_at = Some(now + self.rate.delay());
    }

    /// The earliest instant at which [`ready`][Self::ready] may return a
    /// permit, or `None` if nothing will happen until the next control input.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        if self.credits > 0 {
            return Some(now);
        }
        self.playing.then(|| self.next_play_at.map_or(now, |due| due.max(now)))
    }

    // ── Inspection ────────────────────────────────────────────────────────

    #[inline]
    pub fn playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn rate(&self) -> StepRate {
        self.rate
    }

    #[inline]
    pub fn credits(&self) -> u32 {
        self.credits
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(StepRate::DEFAULT, false)
    }
}
