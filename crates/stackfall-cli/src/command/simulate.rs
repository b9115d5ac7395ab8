use std::{path::PathBuf, time::Duration};

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;
use stackfall_engine::{
    Command, CommandResult, GamePhase, GameSession, GameStats, PieceSeed, SessionSnapshot,
};

use crate::util::{self, Output};

/// Upper bound on frames spent waiting for a debounced command to pass.
const MAX_RETRY_FRAMES: usize = 1000;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Configuration file (the built-in configuration when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for pieces and inputs, as 32 hex digits (random when omitted)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Stop after this many pieces have locked
    #[arg(long, default_value_t = 500)]
    max_pieces: u64,
    /// Simulated frame duration in milliseconds
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandCounts {
    applied: u64,
    rejected: u64,
    ignored: u64,
}

impl CommandCounts {
    fn record(&mut self, result: CommandResult) {
        match result {
            CommandResult::Applied => self.applied += 1,
            CommandResult::Rejected => self.rejected += 1,
            CommandResult::Ignored => self.ignored += 1,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport {
    seed: PieceSeed,
    game_over: bool,
    frames: u64,
    elapsed_ms: f64,
    commands: CommandCounts,
    stats: Option<GameStats>,
    snapshot: SessionSnapshot,
}

struct Simulation {
    session: GameSession,
    frame: Duration,
    frames: u64,
    commands: CommandCounts,
}

impl Simulation {
    fn tick(&mut self) {
        self.session.tick(self.frame);
        self.frames += 1;
    }

    /// Sends a command, advancing frames while it is held back by the debounce window.
    fn send(&mut self, command: Command) -> CommandResult {
        for _ in 0..MAX_RETRY_FRAMES {
            let result = self.session.handle_command(command);
            self.commands.record(result);
            if !result.is_ignored() || !self.session.phase().is_playing() {
                return result;
            }
            self.tick();
        }
        CommandResult::Ignored
    }

    fn completed_pieces(&self) -> u64 {
        self.session
            .state()
            .map_or(0, |state| state.stats().completed_pieces())
    }

    fn play_piece<R>(&mut self, rng: &mut R)
    where
        R: Rng,
    {
        let pieces = self.completed_pieces();
        let still_falling =
            |sim: &Self| sim.session.phase().is_playing() && sim.completed_pieces() == pieces;

        for _ in 0..rng.random_range(0..4) {
            if !still_falling(self) {
                return;
            }
            self.send(Command::Rotate);
        }
        let shift: i32 = rng.random_range(-5..=5);
        let command = if shift < 0 {
            Command::MoveLeft
        } else {
            Command::MoveRight
        };
        for _ in 0..shift.unsigned_abs() {
            if !still_falling(self) {
                return;
            }
            self.send(command);
        }
        for _ in 0..rng.random_range(0..30) {
            if !still_falling(self) {
                return;
            }
            self.tick();
        }
        if still_falling(self) {
            self.send(Command::HardDrop);
        }
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        config,
        seed,
        max_pieces,
        frame_ms,
        output,
    } = arg;
    let config = util::load_config(config.as_deref())?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = Pcg32::from_seed(seed.to_bytes());

    let mut sim = Simulation {
        session: GameSession::with_seed(config, seed)?,
        frame: Duration::from_millis(*frame_ms),
        frames: 0,
        commands: CommandCounts::default(),
    };
    log::info!("simulating with seed {seed}");
    sim.send(Command::Start);
    sim.send(Command::Start);
    anyhow::ensure!(
        sim.session.phase().is_playing() || sim.session.phase().is_game_over(),
        "session did not start"
    );

    while sim.session.phase().is_playing() && sim.completed_pieces() < *max_pieces {
        sim.play_piece(&mut rng);
    }

    let report = SimulationReport {
        seed,
        game_over: sim.session.phase() == GamePhase::GameOver,
        frames: sim.frames,
        elapsed_ms: sim.session.clock_ms(),
        stats: sim.session.state().map(|state| state.stats().clone()),
        snapshot: sim.session.snapshot(),
        commands: sim.commands,
    };
    if let Some(stats) = &report.stats {
        eprintln!(
            "Finished after {} pieces: score {}, level {}, lines {}",
            stats.completed_pieces(),
            stats.score(),
            stats.level(),
            stats.lines()
        );
    }
    Output::save_json(&report, output.clone())?;
    Ok(())
}
