//! Board, piece and movement primitives.
//!
//! - [`Board`] - fixed-size grid of locked cells with collision and line clearing
//! - [`PieceRegistry`] / [`PieceDefinition`] - configuration-derived shape data
//! - [`Piece`] - a live piece with rotation state and position
//! - [`movement`] - validated moves, kicked rotation, hard drop

pub use self::{board::*, piece::*};

pub(crate) mod board;
pub mod movement;
pub(crate) mod piece;
