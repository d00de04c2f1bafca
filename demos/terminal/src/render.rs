//! ASCII frames for the terminal.

use std::io::Write;

use hs_core::{RunId, Tile, World};
use hs_session::{RunOutcome, SessionObserver, TickReport};
use tracing::warn;

/// One character per tile: `#` obstacle, an arrow for the hamster, `.` for
/// an empty tile, the food count up to 9 and `*` beyond.
pub fn render(world: &World) -> String {
    let mut out = String::with_capacity((world.grid.width() + 1) * world.grid.height());
    for (row, tiles) in world.grid.rows().enumerate() {
        for (col, tile) in tiles.iter().enumerate() {
            let here = world.hamster.position.col == col as i32
                && world.hamster.position.row == row as i32;
            out.push(match tile {
                _ if here           => world.hamster.heading.arrow(),
                Tile::Obstacle      => '#',
                Tile::Food(0)       => '.',
                Tile::Food(n @ 1..=9) => char::from_digit(*n, 10).unwrap_or('*'),
                Tile::Food(_)       => '*',
            });
        }
        out.push('\n');
    }
    out
}

/// Prints every frame and outcome to `out`, keeping the last world seen.
pub struct AsciiRenderer<W: Write> {
    out:        W,
    last_world: Option<World>,
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last_world: None }
    }

    pub fn last_world(&self) -> Option<&World> {
        self.last_world.as_ref()
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(%err, "failed to write frame");
        }
    }
}

impl<W: Write> SessionObserver for AsciiRenderer<W> {
    fn on_frame(&mut self, report: &TickReport, world: &World) {
        let frame = format!(
            "{} step {}  carrying {}\n{}\n",
            report.run,
            report.step,
            world.hamster.carried_food,
            render(world)
        );
        self.emit(&frame);
        self.last_world = Some(world.clone());
    }

    fn on_outcome(&mut self, run: RunId, outcome: &RunOutcome) {
        let line = match outcome {
            RunOutcome::Completed   => format!("{run} completed\n"),
            RunOutcome::Failed(err) => format!("{run} failed: {err}\n"),
            RunOutcome::Cancelled   => return,
        };
        self.emit(&line);
    }

    fn on_reset(&mut self, run: RunId) {
        self.emit(&format!("reset, starting {run}\n"));
    }
}
