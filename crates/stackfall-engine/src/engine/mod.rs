//! Game engine logic and state management.
//!
//! This module builds the rules of play on top of the [`core`](crate::core)
//! data structures:
//!
//! - [`BagQueue`] - bag randomizer supplying pieces, seeded by a [`PieceSeed`]
//! - [`GameStats`] - score, level, cleared lines and gravity speed
//! - [`GameState`] - one game: board, falling piece, next piece, hold slot
//! - [`GameSession`] - phase machine, gravity clock and command dispatch
//! - [`InputThrottle`] - per-command debounce windows
//! - [`SessionSnapshot`] - serializable view for renderers and audio
//!
//! # Game Flow
//!
//! 1. Create a [`GameSession`] from a [`GameConfig`](crate::GameConfig)
//! 2. Leave the title and controls screens with any command
//! 3. Call [`GameSession::tick`] every frame and
//!    [`GameSession::handle_command`] for each input
//! 4. A locked piece clears full lines, scores and spawns the next piece
//! 5. The game ends when a new piece overlaps the stack at spawn
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use stackfall_engine::{Command, GameConfig, GamePhase, GameSession};
//!
//! let mut session = GameSession::new(GameConfig::builtin()).unwrap();
//! session.handle_command(Command::Start);
//! session.handle_command(Command::Start);
//!
//! while session.phase() == GamePhase::Playing {
//!     session.handle_command(Command::HardDrop);
//!     session.tick(Duration::from_millis(16));
//! }
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.phase, GamePhase::GameOver);
//! assert!(snapshot.level.is_some());
//! println!("final score: {}", snapshot.score.unwrap_or_default());
//! ```

pub use self::{game_stats::*, input::*, piece_buffer::*, session::*, snapshot::*, state::*};

mod game_stats;
mod input;
mod piece_buffer;
mod session;
mod snapshot;
mod state;
