use std::time::Duration;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{
    config::{ConfigError, GameConfig, GameSettings},
    core::piece::{Piece, PieceRegistry},
};

use super::{
    input::{Command, CommandResult, InputThrottle},
    piece_buffer::PieceSeed,
    snapshot::SessionSnapshot,
    state::GameState,
};

/// Screen-level phase of a session.
///
/// ```text
/// Title -> Controls -> Playing <-> Paused
///             |           |
///           Title      GameOver -> Title
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Title,
    Controls,
    Playing,
    Paused,
    GameOver,
}

/// A play session: phase machine, gravity clock and command dispatch around a [`GameState`].
///
/// The host drives the session with [`tick`](Self::tick) once per frame and
/// [`handle_command`](Self::handle_command) for each decoded input. Only the
/// `Playing` phase runs gravity and accepts gameplay commands; commands that
/// do not apply to the current phase return [`CommandResult::Ignored`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use stackfall_engine::{Command, CommandResult, GameConfig, GamePhase, GameSession, PieceSeed};
///
/// let seed = PieceSeed::from_bytes([3; 16]);
/// let mut session = GameSession::with_seed(GameConfig::builtin(), seed).unwrap();
/// assert_eq!(session.phase(), GamePhase::Title);
///
/// session.handle_command(Command::Start); // title -> controls
/// session.handle_command(Command::Start); // controls -> playing
/// assert!(session.phase().is_playing());
///
/// let y = session.state().unwrap().current().y();
/// session.tick(Duration::from_millis(1000));
/// assert_eq!(session.state().unwrap().current().y(), y + 1);
///
/// assert_eq!(session.handle_command(Command::Restart), CommandResult::Ignored);
/// ```
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    registry: PieceRegistry,
    rng: Pcg32,
    phase: GamePhase,
    state: Option<GameState>,
    gravity_ms: f64,
    clock_ms: f64,
    throttle: InputThrottle,
}

/// Converts a duration to milliseconds, exactly for whole-millisecond values.
#[expect(clippy::cast_precision_loss)]
fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + f64::from(duration.subsec_nanos()) / 1_000_000.0
}

impl GameSession {
    /// Creates a session in the `Title` phase, seeding games from the thread-local RNG.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Like [`Self::new`], but every game of the session is derived from `seed`.
    pub fn with_seed(config: GameConfig, seed: PieceSeed) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = PieceRegistry::from_config(&config)?;
        let throttle = InputThrottle::new(&config.game_settings);
        Ok(Self {
            config,
            registry,
            rng: Pcg32::from_seed(seed.to_bytes()),
            phase: GamePhase::Title,
            state: None,
            gravity_ms: 0.0,
            clock_ms: 0.0,
            throttle,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.config.game_settings
    }

    #[must_use]
    pub fn registry(&self) -> &PieceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// The current or most recent game; `None` before the first start.
    #[must_use]
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// Milliseconds spent in the `Playing` phase since the session was created.
    #[must_use]
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Where the current piece would land if hard-dropped now.
    #[must_use]
    pub fn ghost_piece(&self) -> Option<Piece> {
        self.state.as_ref().map(GameState::ghost_piece)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(self.phase, self.state.as_ref())
    }

    fn set_phase(&mut self, phase: GamePhase) {
        log::debug!("phase {} -> {phase}", self.phase);
        self.phase = phase;
    }

    fn start_game(&mut self) {
        let seed: PieceSeed = self.rng.random();
        let state = GameState::new(&self.registry, &self.config.game_settings, seed);
        let blocked = state.current_collides();
        self.state = Some(state);
        self.gravity_ms = 0.0;
        self.throttle.reset();
        log::info!("game started (seed {seed})");
        self.set_phase(GamePhase::Playing);
        if blocked {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        if let Some(state) = &self.state {
            let stats = state.stats();
            log::info!(
                "game over: score {}, level {}, lines {}, pieces {}",
                stats.score(),
                stats.level(),
                stats.lines(),
                stats.completed_pieces()
            );
        }
        self.set_phase(GamePhase::GameOver);
    }

    /// Advances the engine clock by `elapsed`.
    ///
    /// While playing, elapsed time accumulates towards the fall interval; once
    /// reached, the piece moves down one row (at most once per call) or locks
    /// when it cannot.
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.phase.is_playing() {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let elapsed_ms = duration_ms(elapsed);
        self.clock_ms += elapsed_ms;
        self.gravity_ms += elapsed_ms;
        if self.gravity_ms < state.stats().fall_interval_ms() {
            return;
        }
        self.gravity_ms = 0.0;
        if state.try_move(0, 1).is_err() {
            self.lock_current();
        }
    }

    /// Applies a command according to the current phase.
    pub fn handle_command(&mut self, command: Command) -> CommandResult {
        match (self.phase, command) {
            (GamePhase::Title, _) => self.set_phase(GamePhase::Controls),
            (GamePhase::Controls, Command::Escape) => self.set_phase(GamePhase::Title),
            (GamePhase::Controls, _) => self.start_game(),
            (GamePhase::Playing, Command::Pause) => self.set_phase(GamePhase::Paused),
            (GamePhase::Playing, _) => return self.play(command),
            (GamePhase::Paused, Command::Pause) => self.set_phase(GamePhase::Playing),
            (GamePhase::GameOver, Command::Restart) => self.set_phase(GamePhase::Title),
            (GamePhase::Paused | GamePhase::GameOver, _) => return CommandResult::Ignored,
        }
        CommandResult::Applied
    }

    fn play(&mut self, command: Command) -> CommandResult {
        if let Some(class) = command.throttle_class()
            && !self.throttle.try_accept(class, self.clock_ms)
        {
            return CommandResult::Ignored;
        }
        let Some(state) = self.state.as_mut() else {
            return CommandResult::Ignored;
        };
        let result = match command {
            Command::MoveLeft => state.try_move(-1, 0).is_ok(),
            Command::MoveRight => state.try_move(1, 0).is_ok(),
            Command::Rotate => state.try_rotate().is_ok(),
            Command::SoftDrop => {
                let moved = state.soft_drop().is_ok();
                if moved {
                    self.gravity_ms = 0.0;
                }
                moved
            }
            Command::HardDrop => {
                state.hard_drop();
                self.lock_current();
                true
            }
            Command::Hold => match state.try_hold() {
                Ok(()) => true,
                Err(err) => {
                    log::debug!("hold rejected: {err}");
                    false
                }
            },
            Command::Pause | Command::Escape | Command::Restart | Command::Start => {
                return CommandResult::Ignored;
            }
        };
        if result {
            CommandResult::Applied
        } else {
            CommandResult::Rejected
        }
    }

    fn lock_current(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        self.gravity_ms = 0.0;
        let (_cleared_lines, result) = state.lock_and_spawn();
        if result.is_err() {
            self.game_over();
        }
    }
}
