//! Validated piece movement and rotation against a [`Board`].
//!
//! All functions leave the board untouched; they only commit changes to the
//! piece when the resulting placement is free.

use super::{board::Board, piece::Piece};

/// Offsets tried, in order, when a rotation is attempted.
///
/// The same list is used for every piece and every rotation state. This is
/// **not** a Super Rotation System kick table:
///
/// - No per-orientation offsets
/// - No piece-specific tables
/// - `(0, -1)` moves the piece one row up
pub const KICK_OFFSETS: [(i32, i32); 6] = [(0, 0), (-1, 0), (1, 0), (0, -1), (-2, 0), (2, 0)];

/// Shifts the piece by `(dx, dy)` if the destination is free.
///
/// Returns `false` and leaves the piece unchanged on collision.
pub fn try_move(board: &Board, piece: &mut Piece, dx: i32, dy: i32) -> bool {
    if board.collides(piece, dx, dy) {
        return false;
    }
    *piece = piece.shifted(dx, dy);
    true
}

/// Advances the piece to its next rotation state, trying each of [`KICK_OFFSETS`].
///
/// Offsets are applied to the original position. The first placement that
/// does not collide is committed. When every offset collides, rotation and
/// position are restored and `false` is returned.
///
/// # Example
///
/// ```
/// use stackfall_engine::{Board, GameConfig, Piece, PieceRegistry, movement};
///
/// let registry = PieceRegistry::from_config(&GameConfig::builtin()).unwrap();
/// let i = registry.iter().find(|def| def.name() == "I").unwrap();
/// let board = Board::new(10, 20);
///
/// // Vertical I against the right wall; the horizontal state needs a kick.
/// let mut piece = Piece::new(i.clone()).rotated().shifted(7, 5);
/// assert!(movement::try_rotate(&board, &mut piece));
/// assert_eq!((piece.rotation(), piece.x(), piece.y()), (2, 6, 5));
/// ```
pub fn try_rotate(board: &Board, piece: &mut Piece) -> bool {
    let (rotation, x, y) = (piece.rotation(), piece.x(), piece.y());
    let mut trial = piece.rotated();
    for (kx, ky) in KICK_OFFSETS {
        trial.set_placement(trial.rotation(), x + kx, y + ky);
        if !board.collides(&trial, 0, 0) {
            *piece = trial;
            return true;
        }
    }
    piece.set_placement(rotation, x, y);
    false
}

/// Moves the piece down one row at a time until it rests, returning the rows moved.
pub fn hard_drop(board: &Board, piece: &mut Piece) -> u32 {
    let mut rows = 0;
    while try_move(board, piece, 0, 1) {
        rows += 1;
    }
    rows
}

/// Returns where the piece would come to rest if hard-dropped now.
///
/// Works on a copy; the piece itself is not modified.
#[must_use]
pub fn drop_position(board: &Board, piece: &Piece) -> Piece {
    let mut dropped = piece.clone();
    hard_drop(board, &mut dropped);
    dropped
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{GameConfig, PieceId, PieceRegistry};

    fn registry() -> PieceRegistry {
        PieceRegistry::from_config(&GameConfig::builtin()).unwrap()
    }

    fn piece(registry: &PieceRegistry, id: u8) -> Piece {
        let def = registry.get(PieceId::new(id).unwrap()).unwrap();
        Piece::new(Arc::clone(def))
    }

    fn placement(piece: &Piece) -> (usize, i32, i32) {
        (piece.rotation(), piece.x(), piece.y())
    }

    #[test]
    fn test_try_move_walls_and_floor() {
        let registry = registry();
        let board = Board::new(10, 20);

        // T is 3 columns wide in its spawn state.
        let mut t = piece(&registry, 3).shifted(0, 5);
        assert!(!try_move(&board, &mut t, -1, 0));
        assert_eq!(placement(&t), (0, 0, 5));

        let mut t = piece(&registry, 3).shifted(10 - 3, 5);
        assert!(!try_move(&board, &mut t, 1, 0));
        assert_eq!(placement(&t), (0, 7, 5));

        // Bottom row of the T matrix is empty, so it rests with y = height - 2.
        let mut t = piece(&registry, 3).shifted(4, 18);
        assert!(!try_move(&board, &mut t, 0, 1));
        assert_eq!(placement(&t), (0, 4, 18));
    }

    #[test]
    fn test_try_move_commits_on_success() {
        let registry = registry();
        let board = Board::new(10, 20);
        let mut o = piece(&registry, 2).shifted(4, 0);
        assert!(try_move(&board, &mut o, 1, 0));
        assert!(try_move(&board, &mut o, 0, 1));
        assert_eq!(placement(&o), (0, 5, 1));
    }

    #[test]
    fn test_rotate_in_open_space_uses_first_offset() {
        let registry = registry();
        let board = Board::new(10, 20);
        let mut t = piece(&registry, 3).shifted(4, 5);
        assert!(try_rotate(&board, &mut t));
        assert_eq!(placement(&t), (1, 4, 5));
    }

    #[test]
    fn test_rotate_kicks_off_left_wall() {
        let registry = registry();
        let board = Board::new(10, 20);
        // Vertical I (rotation 3) occupies column x + 1; put it against the left wall.
        let mut i = piece(&registry, 1).rotated().rotated().rotated().shifted(-1, 5);
        assert_eq!(placement(&i), (3, -1, 5));
        assert!(!board.collides(&i, 0, 0));

        // Horizontal I at x = -1 collides; (-1, 0) collides; (1, 0) fits.
        assert!(try_rotate(&board, &mut i));
        assert_eq!(placement(&i), (0, 0, 5));
    }

    #[test]
    fn test_rotate_kicks_up_from_floor() {
        let registry = registry();
        let board = Board::new(5, 4);
        // T resting on the floor; its next state reaches one row lower.
        let mut t = piece(&registry, 3).shifted(0, 2);
        assert!(board.collides(&t, 0, 1));

        // (0, 0), (-1, 0) and (1, 0) all poke through the floor; (0, -1) fits.
        assert!(try_rotate(&board, &mut t));
        assert_eq!(placement(&t), (1, 0, 1));
    }

    #[test]
    fn test_rotate_rejected_restores_state() {
        let registry = registry();
        // 3-wide well: the horizontal I cannot fit anywhere.
        let board = Board::from_ascii(
            "
            #...#
            #...#
            #...#
            #...#
            #...#
            ",
        );
        let mut i = piece(&registry, 1).rotated().shifted(-1, 0);
        assert_eq!(placement(&i), (1, -1, 0));
        assert!(!board.collides(&i, 0, 0));

        let before = i.clone();
        assert!(!try_rotate(&board, &mut i));
        assert_eq!(i, before);
        assert_eq!(placement(&i), (1, -1, 0));
    }

    #[test]
    fn test_rotate_single_state_piece() {
        let registry = registry();
        let board = Board::new(10, 20);
        let mut o = piece(&registry, 2).shifted(3, 3);
        assert!(try_rotate(&board, &mut o));
        assert_eq!(placement(&o), (0, 3, 3));
    }

    #[test]
    fn test_hard_drop_counts_rows() {
        let registry = registry();
        let board = Board::from_ascii(
            "
            ....
            ....
            ....
            ....
            ....
            #...
            ",
        );
        let mut o = piece(&registry, 2);
        assert_eq!(hard_drop(&board, &mut o), 3);
        assert_eq!(placement(&o), (0, 0, 3));
        assert_eq!(hard_drop(&board, &mut o), 0);
    }

    #[test]
    fn test_drop_position_does_not_modify_piece() {
        let registry = registry();
        let board = Board::new(6, 8);
        let o = piece(&registry, 2).shifted(2, 0);
        let ghost = drop_position(&board, &o);
        assert_eq!(placement(&o), (0, 2, 0));
        assert_eq!(placement(&ghost), (0, 2, 6));
        assert!(board.is_empty());
    }
}
