//! Keyboard controller: one command per character, read line by line.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use hs_session::{ControlHandle, SessionResult};
use tracing::debug;

/// Rate change per `+` / `-` keypress.
const RATE_NUDGE: u8 = 10;

pub const HELP: &str = "keys (then Enter): p play/pause  s step  r reset  + faster  - slower  q quit";

/// Apply one key.  Returns `false` once the session should stop.
pub fn apply_key(control: &ControlHandle, key: char) -> SessionResult<bool> {
    match key {
        'p' => control.toggle_playing()?,
        's' => control.step()?,
        'r' => control.reset()?,
        '+' => control.faster(RATE_NUDGE)?,
        '-' => control.slower(RATE_NUDGE)?,
        'q' => {
            control.shutdown()?;
            return Ok(false);
        }
        other => debug!(key = %other, "ignoring key"),
    }
    Ok(true)
}

/// Read commands from `input` until `q`, end of input, or the driver exits.
pub fn spawn_reader<R>(input: R, control: ControlHandle) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            for key in line.chars().filter(|c| !c.is_whitespace()) {
                match apply_key(&control, key) {
                    Ok(true) => {}
                    Ok(false) | Err(_) => return,
                }
            }
        }
        let _ = control.shutdown();
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use hs_agent::{Agent, AgentResult};
    use hs_core::World;
    use hs_session::{Driver, SessionBuilder, SessionObserver, TickReport};

    use super::*;

    fn spin(hamster: &Agent) -> AgentResult<()> {
        loop {
            hamster.turn_left()?;
        }
    }

    #[derive(Default)]
    struct Steps(usize);

    impl SessionObserver for Steps {
        fn on_frame(&mut self, report: &TickReport, _world: &World) {
            if report.stepped {
                self.0 += 1;
            }
        }
    }

    #[test]
    fn keys_map_to_commands() {
        let session = SessionBuilder::new(World::demo(), spin).build().unwrap();
        let (driver, control) = Driver::new(session, Steps::default());
        assert!(apply_key(&control, 's').unwrap());
        assert!(apply_key(&control, 'x').unwrap());
        assert!(apply_key(&control, 's').unwrap());
        assert!(!apply_key(&control, 'q').unwrap());
        assert_eq!(driver.run().unwrap().0, 2);
    }

    #[test]
    fn reader_shuts_down_at_end_of_input() {
        let session = SessionBuilder::new(World::demo(), spin).build().unwrap();
        let (driver, control) = Driver::new(session, Steps::default());
        spawn_reader(Cursor::new("s s\ns\n"), control).join().unwrap();
        assert_eq!(driver.run().unwrap().0, 3);
    }
}
