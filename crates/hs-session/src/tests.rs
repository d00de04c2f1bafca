//! Integration tests for hs-session.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use hs_agent::{Abort, Agent, AgentResult, FatalError, WallFollower};
use hs_core::{AgentState, CoreError, Heading, Position, RunId, World, parse_grid};
use hs_gate::{Permit, StepRate};

use crate::session::BUSY_POLL;
use crate::{
    Driver, RunOutcome, SessionBuilder, SessionConfig, SessionError, SessionObserver,
    SimulationSession, Snapshot, TickReport,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 3×3: only the centre and its left neighbour are walkable.
const POCKET: &str = "X,X,X\n0,0,X\nX,X,X\n";

fn pocket(heading: Heading) -> World {
    World::new(parse_grid(POCKET).unwrap(), AgentState::new(Position::new(1, 1), heading)).unwrap()
}

/// Waits forever, bumping `counter` right before each action.
fn counting(counter: &Arc<AtomicUsize>) -> impl Fn(&Agent) -> AgentResult<()> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |hamster: &Agent| -> AgentResult<()> {
        loop {
            counter.fetch_add(1, Ordering::SeqCst);
            hamster.wait()?;
        }
    }
}

fn spin(hamster: &Agent) -> AgentResult<()> {
    loop {
        hamster.turn_left()?;
    }
}

fn charge(hamster: &Agent) -> AgentResult<()> {
    loop {
        hamster.forward()?;
    }
}

/// Turns once, then ends its own run as cancelled.
fn gives_up(hamster: &Agent) -> AgentResult<()> {
    hamster.turn_left()?;
    Err(Abort::Cancelled)
}

fn paused(world: World, behavior: impl hs_agent::Behavior) -> SimulationSession {
    SessionBuilder::new(world, behavior).build().unwrap()
}

fn step(session: &mut SimulationSession) -> TickReport {
    session.request_single_step();
    session.tick(Instant::now())
}

#[derive(Default)]
struct Recorder {
    frames:   Vec<(RunId, bool, Heading)>,
    outcomes: Vec<(RunId, RunOutcome)>,
    resets:   Vec<RunId>,
}

impl SessionObserver for Recorder {
    fn on_frame(&mut self, report: &TickReport, world: &World) {
        self.frames.push((report.run, report.stepped, world.hamster.heading));
    }

    fn on_outcome(&mut self, run: RunId, outcome: &RunOutcome) {
        self.outcomes.push((run, outcome.clone()));
    }

    fn on_reset(&mut self, run: RunId) {
        self.resets.push(run);
    }
}

// ── SessionBuilder ────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_parked_first_run() {
        let session = paused(World::demo(), WallFollower);
        assert_eq!(session.current_run(), Some(RunId(1)));
        assert_eq!(session.steps(), 0);
        assert!(!session.is_playing());
        assert_eq!(session.rate(), StepRate::DEFAULT);
        assert_eq!(session.world(), World::demo());
        assert_eq!(session.behavior_name(), "wall-follower");
    }

    #[test]
    fn rejects_start_on_obstacle() {
        let world = World {
            grid:    parse_grid(POCKET).unwrap(),
            hamster: AgentState::new(Position::new(0, 0), Heading::Up),
        };
        let result = SessionBuilder::new(world, WallFollower).build();
        assert!(matches!(
            result,
            Err(SessionError::Core(CoreError::InvalidStart(p))) if p == Position::new(0, 0)
        ));
    }

    #[test]
    fn config_is_applied() {
        let config = SessionConfig { playing: true, rate: StepRate::new(80), ..Default::default() };
        let session = SessionBuilder::new(World::demo(), WallFollower).config(config).build().unwrap();
        assert!(session.is_playing());
        assert_eq!(session.rate().control(), 80);
    }
}

// ── Stepping ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod step_tests {
    use super::*;

    #[test]
    fn nothing_moves_while_paused() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut session = paused(World::demo(), counting(&counter));
        let now = Instant::now();
        for _ in 0..5 {
            let report = session.tick(now);
            assert!(!report.stepped);
            assert_eq!(report.outcome, None);
        }
        assert_eq!(session.next_deadline(now), None);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_step_while_paused_advances_one_action() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut session = paused(World::demo(), counting(&counter));

        for expected in 1..=4 {
            let report = step(&mut session);
            assert!(report.stepped);
            assert_eq!(report.permit, Some(Permit::Credit));
            assert_eq!(report.step, expected as u64);
            assert_eq!(counter.load(Ordering::SeqCst), expected);

            // No credit left: further ticks change nothing.
            assert!(!session.tick(Instant::now()).stepped);
            assert_eq!(counter.load(Ordering::SeqCst), expected);
        }
    }

    #[test]
    fn one_mutation_per_step() {
        let mut session = paused(World::demo(), spin);
        let mut heading = Heading::Down;
        for _ in 0..6 {
            step(&mut session);
            heading = heading.turned_left();
            assert_eq!(session.world().hamster.heading, heading);
        }
    }

    #[test]
    fn queued_credits_are_spent_one_per_tick() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut session = paused(World::demo(), counting(&counter));
        session.request_single_step();
        session.request_single_step();
        assert_eq!(session.pending_steps(), 2);

        assert!(session.tick(Instant::now()).stepped);
        assert_eq!(session.pending_steps(), 1);
        assert!(session.tick(Instant::now()).stepped);
        assert_eq!(session.pending_steps(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn play_mode_steps_on_its_own() {
        let config = SessionConfig { playing: true, rate: StepRate::MAX, ..Default::default() };
        let mut session = SessionBuilder::new(World::demo(), spin).config(config).build().unwrap();

        let give_up = Instant::now() + Duration::from_secs(5);
        while session.steps() < 4 && Instant::now() < give_up {
            let now = Instant::now();
            if let Some(deadline) = session.next_deadline(now) {
                thread::sleep(deadline.saturating_duration_since(now));
            }
            session.tick(Instant::now());
        }
        assert!(session.steps() >= 4, "only {} steps", session.steps());
    }

    #[test]
    fn step_requested_while_busy_is_kept() {
        let go = Arc::new(AtomicBool::new(false));
        let busy = {
            let go = Arc::clone(&go);
            move |hamster: &Agent| -> AgentResult<()> {
                while !go.load(Ordering::SeqCst) {
                    hamster.is_free();
                }
                spin(hamster)
            }
        };
        let config = SessionConfig { settle_timeout: Duration::from_millis(200), ..Default::default() };
        let mut session = SessionBuilder::new(World::demo(), busy).config(config).build().unwrap();

        // Release the start handshake; the behavior now loops on queries.
        assert!(step(&mut session).stepped);
        assert_eq!(session.world().hamster.heading, Heading::Down);

        let report = step(&mut session);
        assert!(!report.stepped);
        assert_eq!(report.permit, None);
        assert_eq!(session.pending_steps(), 1);
        let now = Instant::now();
        assert_eq!(session.next_deadline(now), Some(now + BUSY_POLL));

        // Its first action runs on the earlier grant, then it parks.
        go.store(true, Ordering::SeqCst);
        let give_up = Instant::now() + Duration::from_secs(5);
        while session.world().hamster.heading == Heading::Down && Instant::now() < give_up {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(session.world().hamster.heading, Heading::Right);

        let report = session.tick(Instant::now());
        assert!(report.stepped);
        assert_eq!(report.permit, Some(Permit::Credit));
        assert_eq!(session.pending_steps(), 0);
        assert_eq!(session.world().hamster.heading, Heading::Up);

        assert!(!session.tick(Instant::now()).stepped);
        assert_eq!(session.world().hamster.heading, Heading::Up);
    }

    #[test]
    fn toggle_and_rate_controls() {
        let mut session = paused(World::demo(), spin);
        assert!(session.toggle_playing());
        assert!(session.is_playing());
        assert!(!session.toggle_playing());
        session.set_playing(true);
        assert!(session.is_playing());
        session.set_rate(StepRate::new(10));
        assert_eq!(session.rate(), StepRate::new(10));
    }
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod outcome_tests {
    use super::*;

    #[test]
    fn collision_fails_the_run() {
        let mut session = paused(pocket(Heading::Left), charge);

        let first = step(&mut session);
        assert_eq!(first.outcome, None);
        assert_eq!(session.world().hamster.position, Position::new(0, 1));

        let second = step(&mut session);
        assert_eq!(
            second.outcome,
            Some(RunOutcome::Failed(FatalError::Collision {
                at:      Position::new(0, 1),
                heading: Heading::Left,
                target:  Position::new(-1, 1),
            }))
        );
        assert_eq!(session.world().hamster.position, Position::new(0, 1));

        // Reported once only.
        assert_eq!(step(&mut session).outcome, None);
    }

    #[test]
    fn swallowed_fault_still_fails() {
        let stubborn = |hamster: &Agent| -> AgentResult<()> {
            let _ = hamster.forward();
            hamster.turn_left()?;
            Ok(())
        };
        let mut session = paused(pocket(Heading::Up), stubborn);
        let report = step(&mut session);
        assert!(matches!(
            report.outcome,
            Some(RunOutcome::Failed(FatalError::Collision { .. }))
        ));
        assert_eq!(session.world().hamster.heading, Heading::Up);
    }

    #[test]
    fn returning_completes_the_run() {
        let once = |hamster: &Agent| -> AgentResult<()> { hamster.turn_right() };
        let mut session = paused(World::demo(), once);

        assert_eq!(step(&mut session).outcome, None);
        assert_eq!(step(&mut session).outcome, Some(RunOutcome::Completed));
        assert_eq!(session.world().hamster.heading, Heading::Left);
    }

    #[test]
    fn repeat_reinvokes_on_same_world() {
        let once = |hamster: &Agent| -> AgentResult<()> { hamster.turn_right() };
        let config = SessionConfig { repeat_behavior: true, ..Default::default() };
        let mut session = SessionBuilder::new(World::demo(), once).config(config).build().unwrap();

        for _ in 0..3 {
            assert_eq!(step(&mut session).outcome, None);
        }
        // Down → Left → Up → Right.
        assert_eq!(session.world().hamster.heading, Heading::Right);
    }

    #[test]
    fn repeating_empty_behavior_waits_for_steps() {
        let nothing = |_: &Agent| -> AgentResult<()> { Ok(()) };
        let config = SessionConfig { repeat_behavior: true, ..Default::default() };
        let mut session = SessionBuilder::new(World::demo(), nothing).config(config).build().unwrap();

        for expected in 1..=3 {
            let report = step(&mut session);
            assert!(report.stepped);
            assert_eq!(report.outcome, None);
            assert_eq!(report.step, expected);
        }
        assert_eq!(session.world(), World::demo());
    }

    #[test]
    fn giving_up_is_cancelled() {
        let mut session = paused(World::demo(), gives_up);
        assert_eq!(step(&mut session).outcome, None);
        assert_eq!(step(&mut session).outcome, Some(RunOutcome::Cancelled));
    }

    #[test]
    fn cancelling_own_gate_is_cancelled() {
        let quits = |hamster: &Agent| -> AgentResult<()> {
            hamster.turn_left()?;
            hamster.gate().cancel();
            hamster.wait()
        };
        let mut session = paused(World::demo(), quits);
        step(&mut session);
        assert_eq!(step(&mut session).outcome, Some(RunOutcome::Cancelled));
        assert_eq!(session.world().hamster.heading, Heading::Right);
    }

    #[test]
    fn panic_becomes_failure() {
        let boom = |hamster: &Agent| -> AgentResult<()> {
            hamster.turn_left()?;
            panic!("boom");
        };
        let mut session = paused(World::demo(), boom);
        step(&mut session);
        let report = step(&mut session);
        assert_eq!(report.outcome, Some(RunOutcome::Failed(FatalError::Panicked("boom".into()))));
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod snapshot_tests {
    use super::*;

    #[test]
    fn restored_copies_are_independent() {
        let snapshot = Snapshot::capture(&World::demo());
        let mut copy = snapshot.restore();
        copy.grid.take_food_at(2, 1, 90);
        copy.hamster.heading = Heading::Up;

        assert_eq!(*snapshot.world(), World::demo());
        assert_eq!(snapshot.restore(), World::demo());
        assert_ne!(copy, snapshot.restore());
    }
}

// ── Reset ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod reset_tests {
    use super::*;

    /// Spins forever and hands the test a clone of every run's agent.
    fn leaky(agents: &Arc<Mutex<Vec<Agent>>>) -> impl Fn(&Agent) -> AgentResult<()> + Send + Sync + 'static {
        let agents = Arc::clone(agents);
        move |hamster: &Agent| -> AgentResult<()> {
            agents.lock().unwrap().push(hamster.clone());
            spin(hamster)
        }
    }

    #[test]
    fn reset_unwinds_blocked_run() {
        let agents = Arc::new(Mutex::new(Vec::new()));
        let mut session = paused(World::demo(), leaky(&agents));
        for _ in 0..3 {
            step(&mut session);
        }
        let old = agents.lock().unwrap()[0].clone();
        let old_world = old.world();
        assert_eq!(old_world.hamster.heading, Heading::Left);

        let run = session.reset().unwrap();
        assert_eq!(run, RunId(2));
        assert!(old.gate().is_cancelled());
        assert!(old.gate().is_finished(), "old run unwound");
        assert_eq!(session.world(), *session.snapshot());
        assert_eq!(session.world(), World::demo());
        assert_eq!(session.steps(), 0);

        for _ in 0..2 {
            step(&mut session);
        }
        assert_eq!(old.world(), old_world, "old world untouched after reset");
        assert_eq!(session.world().hamster.heading, Heading::Up);
    }

    #[test]
    fn reset_while_paused_shows_snapshot() {
        let mut session = paused(World::demo(), WallFollower);
        for _ in 0..5 {
            step(&mut session);
        }
        assert_ne!(session.world(), World::demo());
        session.reset().unwrap();
        assert_eq!(session.world(), World::demo());
    }

    #[test]
    fn reset_clears_credits_keeps_controls() {
        let mut session = paused(World::demo(), spin);
        session.set_playing(true);
        session.set_rate(StepRate::new(70));
        session.request_single_step();
        session.request_single_step();
        session.reset().unwrap();
        assert_eq!(session.pending_steps(), 0);
        assert!(session.is_playing());
        assert_eq!(session.rate().control(), 70);
    }

    #[test]
    fn reset_after_failure_starts_fresh() {
        let mut session = paused(pocket(Heading::Left), charge);
        step(&mut session);
        assert!(step(&mut session).outcome.is_some());
        session.reset().unwrap();
        assert_eq!(session.world(), pocket(Heading::Left));
        step(&mut session);
        assert_eq!(session.world().hamster.position, Position::new(0, 1));
    }

    #[test]
    fn shutdown_stops_run() {
        let agents = Arc::new(Mutex::new(Vec::new()));
        let mut session = paused(World::demo(), leaky(&agents));
        step(&mut session);
        session.shutdown();
        assert_eq!(session.current_run(), None);
        let old = agents.lock().unwrap()[0].clone();
        assert!(old.gate().is_finished());
        assert_eq!(session.world(), World::demo(), "falls back to the snapshot");
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod driver_tests {
    use super::*;

    #[test]
    fn queued_steps_each_get_a_frame() {
        let (driver, control) = Driver::new(paused(World::demo(), spin), Recorder::default());
        for _ in 0..3 {
            control.step().unwrap();
        }
        control.shutdown().unwrap();

        let rec = driver.run().unwrap();
        let stepped: Vec<Heading> =
            rec.frames.iter().filter(|f| f.1).map(|f| f.2).collect();
        assert_eq!(stepped, vec![Heading::Right, Heading::Up, Heading::Left]);
        assert!(rec.outcomes.is_empty());
        assert!(rec.resets.is_empty());
    }

    #[test]
    fn failure_is_reported_then_reset() {
        let (driver, control) = Driver::new(paused(pocket(Heading::Left), charge), Recorder::default());
        control.step().unwrap();
        control.step().unwrap();
        control.shutdown().unwrap();

        let rec = driver.run().unwrap();
        assert_eq!(rec.outcomes.len(), 1);
        assert_eq!(rec.outcomes[0].0, RunId(1));
        assert!(matches!(rec.outcomes[0].1, RunOutcome::Failed(FatalError::Collision { .. })));
        assert_eq!(rec.resets, vec![RunId(2)]);
        let last = rec.frames.last().unwrap();
        assert_eq!((last.0, last.1), (RunId(2), false));
    }

    #[test]
    fn self_cancelled_run_restarts_silently() {
        let (driver, control) = Driver::new(paused(World::demo(), gives_up), Recorder::default());
        for _ in 0..5 {
            control.step().unwrap();
        }
        control.shutdown().unwrap();

        let rec = driver.run().unwrap();
        assert!(rec.outcomes.is_empty(), "cancellation is not reported");
        assert_eq!(rec.resets, vec![RunId(2), RunId(3)]);
        let stepped: Vec<RunId> = rec.frames.iter().filter(|f| f.1).map(|f| f.0).collect();
        assert_eq!(stepped, vec![RunId(1), RunId(1), RunId(2), RunId(2), RunId(3)]);
    }

    #[test]
    fn duplicate_resets_coalesce() {
        let (driver, control) = Driver::new(paused(World::demo(), spin), Recorder::default());
        control.reset().unwrap();
        control.reset().unwrap();
        control.clone().reset().unwrap();
        control.shutdown().unwrap();

        let rec = driver.run().unwrap();
        assert_eq!(rec.resets, vec![RunId(2)]);
    }

    #[test]
    fn dropping_every_handle_stops_driver() {
        let (driver, control) = Driver::new(paused(World::demo(), spin), Recorder::default());
        drop(control);
        let rec = driver.run().unwrap();
        assert_eq!(rec.frames.len(), 1, "only the initial frame");
    }

    #[test]
    fn handle_reports_disconnect() {
        let (driver, control) = Driver::new(paused(World::demo(), spin), Recorder::default());
        control.shutdown().unwrap();
        driver.run().unwrap();
        assert!(matches!(control.step(), Err(SessionError::Disconnected)));
    }

    #[test]
    fn driver_on_its_own_thread() {
        let counter = Arc::new(AtomicUsize::new(0));
        let config = SessionConfig { playing: true, rate: StepRate::MAX, ..Default::default() };
        let session = SessionBuilder::new(World::demo(), counting(&counter))
            .config(config)
            .build()
            .unwrap();
        let (driver, control) = Driver::new(session, Recorder::default());
        let worker = thread::spawn(move || driver.run());

        let give_up = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < 3 && Instant::now() < give_up {
            thread::sleep(Duration::from_millis(10));
        }
        control.set_playing(false).unwrap();
        control.shutdown().unwrap();

        let rec = worker.join().unwrap().unwrap();
        assert!(counter.load(Ordering::SeqCst) >= 3);
        assert!(rec.frames.iter().filter(|f| f.1).count() >= 3);
    }
}
