//! Game-logic engine for a falling-block puzzle.
//!
//! The engine is configured by a JSON document ([`GameConfig`]) describing the
//! grid, timing, scoring and every piece shape. It is renderer-agnostic: hosts
//! feed it elapsed time and decoded [`Command`]s and read back a
//! [`SessionSnapshot`].
//!
//! - [`core`] - board, pieces and validated movement
//! - [`engine`] - randomizer, scoring, game state and session phases
//! - [`config`] - configuration model and loading

pub use self::{config::*, core::*, engine::*};

pub mod config;
pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("piece collides with the board")]
pub struct PieceCollisionError;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum HoldError {
    #[display("incoming piece collides at its spawn position")]
    PieceCollision(PieceCollisionError),
    #[display("hold already used for this piece")]
    HoldAlreadyUsed,
}
