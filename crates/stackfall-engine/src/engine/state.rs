use crate::{
    HoldError, PieceCollisionError,
    config::GameSettings,
    core::{
        board::Board,
        movement,
        piece::{Piece, PieceRegistry},
    },
};

use super::{
    game_stats::GameStats,
    piece_buffer::{BagQueue, PieceSeed},
};

/// State of a single game: board, falling piece, preview, hold slot and statistics.
///
/// `GameState` knows nothing about phases or time; [`GameSession`](super::GameSession)
/// decides when its operations run. Every operation either commits completely
/// or leaves the state unchanged.
///
/// # Example
///
/// ```
/// use stackfall_engine::{GameConfig, GameState, PieceRegistry, PieceSeed};
///
/// let config = GameConfig::builtin();
/// let registry = PieceRegistry::from_config(&config).unwrap();
/// let seed = PieceSeed::from_bytes([7; 16]);
/// let mut state = GameState::new(&registry, &config.game_settings, seed);
///
/// let rows = state.hard_drop();
/// assert!(rows > 0);
/// let (cleared, result) = state.lock_and_spawn();
/// assert_eq!(cleared, 0);
/// assert!(result.is_ok());
/// assert_eq!(state.stats().completed_pieces(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    bag: BagQueue,
    current: Piece,
    next: Piece,
    hold: Option<Piece>,
    can_swap_hold: bool,
    stats: GameStats,
}

impl GameState {
    /// Starts a new game: empty board, fresh bag and statistics, first two pieces drawn.
    ///
    /// The first piece is not checked against the board; see [`Self::current_collides`].
    #[must_use]
    pub fn new(registry: &PieceRegistry, settings: &GameSettings, seed: PieceSeed) -> Self {
        let mut bag = BagQueue::with_seed(registry, settings.grid_width, seed);
        let current = bag.draw();
        let next = bag.draw();
        Self {
            board: Board::new(settings.grid_width, settings.grid_height),
            bag,
            current,
            next,
            hold: None,
            can_swap_hold: true,
            stats: GameStats::new(settings),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn current(&self) -> &Piece {
        &self.current
    }

    #[must_use]
    pub fn next(&self) -> &Piece {
        &self.next
    }

    #[must_use]
    pub fn held(&self) -> Option<&Piece> {
        self.hold.as_ref()
    }

    #[must_use]
    pub fn can_swap_hold(&self) -> bool {
        self.can_swap_hold
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Pieces queued after [`Self::next`], in draw order.
    pub fn upcoming(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.bag.upcoming()
    }

    /// Returns `true` if the current piece overlaps the board where it stands.
    #[must_use]
    pub fn current_collides(&self) -> bool {
        self.board.collides(&self.current, 0, 0)
    }

    /// Where the current piece would land if hard-dropped now.
    #[must_use]
    pub fn ghost_piece(&self) -> Piece {
        movement::drop_position(&self.board, &self.current)
    }

    pub fn try_move(&mut self, dx: i32, dy: i32) -> Result<(), PieceCollisionError> {
        if movement::try_move(&self.board, &mut self.current, dx, dy) {
            Ok(())
        } else {
            Err(PieceCollisionError)
        }
    }

    pub fn try_rotate(&mut self) -> Result<(), PieceCollisionError> {
        if movement::try_rotate(&self.board, &mut self.current) {
            Ok(())
        } else {
            Err(PieceCollisionError)
        }
    }

    /// Moves the current piece down one row, awarding the soft-drop bonus.
    ///
    /// A blocked soft drop does not lock the piece.
    pub fn soft_drop(&mut self) -> Result<(), PieceCollisionError> {
        self.try_move(0, 1)?;
        self.stats.add_soft_drop();
        Ok(())
    }

    /// Drops the current piece to its resting row and awards the hard-drop bonus.
    ///
    /// Returns the number of rows moved. The piece is not locked; follow up
    /// with [`Self::lock_and_spawn`].
    pub fn hard_drop(&mut self) -> u32 {
        let rows = movement::hard_drop(&self.board, &mut self.current);
        self.stats.add_hard_drop(rows);
        rows
    }

    /// Swaps the current piece with the hold slot.
    ///
    /// With an empty slot the next piece becomes current and a new next piece
    /// is drawn; otherwise the held piece returns at its spawn position. The
    /// outgoing piece is stored in rotation state 0 at the display origin.
    /// Allowed once per piece; the allowance returns on the next lock.
    ///
    /// The swap is also refused, with the state untouched, when the incoming
    /// piece would overlap the stack where it appears. This guard is specific
    /// to this engine: a plain hold swap checks only the once-per-piece rule.
    pub fn try_hold(&mut self) -> Result<(), HoldError> {
        if !self.can_swap_hold {
            return Err(HoldError::HoldAlreadyUsed);
        }
        let incoming = match &self.hold {
            Some(held) => held.respawned(self.board.width()),
            None => self.next.clone(),
        };
        if self.board.collides(&incoming, 0, 0) {
            return Err(HoldError::PieceCollision(PieceCollisionError));
        }

        let outgoing = std::mem::replace(&mut self.current, incoming);
        if self.hold.replace(outgoing.at_display_origin()).is_none() {
            self.next = self.bag.draw();
        }
        self.can_swap_hold = false;
        Ok(())
    }

    /// Locks the current piece, clears full lines, updates statistics and spawns the next piece.
    ///
    /// Returns the number of cleared lines together with the spawn result. On
    /// `Err` the new piece overlaps the stack: the game is over and the board
    /// is left exactly as it was after the clear.
    pub fn lock_and_spawn(&mut self) -> (usize, Result<(), PieceCollisionError>) {
        self.board.lock(&self.current);
        let cleared_lines = self.board.clear_full_lines();
        let levels_gained = self.stats.record_lock(cleared_lines);
        log::debug!(
            "locked {} clearing {cleared_lines} line(s); score {}",
            self.current,
            self.stats.score()
        );
        if levels_gained > 0 {
            log::debug!(
                "level up to {} (fall interval {:.1} ms)",
                self.stats.level(),
                self.stats.fall_interval_ms()
            );
        }

        let next = std::mem::replace(&mut self.next, self.bag.draw());
        self.current = next;
        self.can_swap_hold = true;
        if self.current_collides() {
            return (cleared_lines, Err(PieceCollisionError));
        }
        (cleared_lines, Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameConfig, PieceId};

    const SEED: PieceSeed = PieceSeed::from_bytes([0x5A; 16]);

    fn new_state(config: &GameConfig) -> GameState {
        let registry = PieceRegistry::from_config(config).unwrap();
        GameState::new(&registry, &config.game_settings, SEED)
    }

    #[test]
    fn test_new_state() {
        let config = GameConfig::builtin();
        let state = new_state(&config);
        assert!(state.board().is_empty());
        assert!(state.held().is_none());
        assert!(state.can_swap_hold());
        assert!(!state.current_collides());
        assert_eq!(state.stats().level(), 1);
        assert_ne!(state.current().id(), state.next().id());
        // current + next + upcoming start with the first bag in order.
        assert_eq!(state.upcoming().count(), 12);
    }

    #[test]
    fn test_same_seed_same_game() {
        let config = GameConfig::builtin();
        let mut a = new_state(&config);
        let mut b = new_state(&config);
        for _ in 0..5 {
            assert_eq!(a.current(), b.current());
            a.hard_drop();
            b.hard_drop();
            a.lock_and_spawn().1.unwrap();
            b.lock_and_spawn().1.unwrap();
        }
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn test_move_and_rotate_results() {
        let config = GameConfig::builtin();
        let mut state = new_state(&config);
        for _ in 0..10 {
            if state.try_move(-1, 0).is_err() {
                break;
            }
        }
        assert!(state.try_move(-1, 0).is_err());
        let before = state.current().clone();
        assert!(state.try_move(1, 0).is_ok());
        assert_eq!(state.current().x(), before.x() + 1);
        assert!(state.try_rotate().is_ok());
    }

    #[test]
    fn test_soft_drop_scores_and_stops_at_floor() {
        let config = GameConfig::builtin();
        let mut state = new_state(&config);
        assert!(state.soft_drop().is_ok());
        assert_eq!(state.stats().score(), 1);

        let rows = state.hard_drop();
        assert_eq!(state.stats().score(), 1 + 2 * u64::from(rows));
        let score = state.stats().score();
        assert!(state.soft_drop().is_err());
        assert_eq!(state.stats().score(), score);
        assert!(state.board().is_empty());
    }

    #[test]
    fn test_hold_empty_slot_takes_next() {
        let config = GameConfig::builtin();
        let mut state = new_state(&config);
        let current = state.current().clone();
        let next = state.next().clone();
        let after_next = state.upcoming().next().unwrap().clone();

        state.try_move(1, 0).unwrap();
        state.try_rotate().unwrap();
        state.try_hold().unwrap();

        assert_eq!(state.current(), &next);
        assert_eq!(state.next(), &after_next);
        let held = state.held().unwrap();
        assert_eq!(held.id(), current.id());
        assert_eq!((held.rotation(), held.x(), held.y()), (0, 0, 0));
        assert!(!state.can_swap_hold());
    }

    #[test]
    fn test_hold_is_single_use_until_lock() {
        let config = GameConfig::builtin();
        let mut state = new_state(&config);
        state.try_hold().unwrap();
        let current = state.current().clone();
        assert!(matches!(state.try_hold(), Err(HoldError::HoldAlreadyUsed)));
        assert_eq!(state.current(), &current);

        state.hard_drop();
        state.lock_and_spawn().1.unwrap();
        assert!(state.can_swap_hold());

        // Occupied slot: the held piece comes back at its spawn position.
        let held_id = state.held().unwrap().id();
        let outgoing_id = state.current().id();
        let next = state.next().clone();
        state.try_hold().unwrap();
        assert_eq!(state.current().id(), held_id);
        assert_eq!(state.current(), &state.current().respawned(10));
        assert_eq!(state.held().unwrap().id(), outgoing_id);
        assert_eq!(state.next(), &next);
    }

    #[test]
    fn test_hold_refused_when_incoming_piece_overlaps() {
        let config = GameConfig::builtin();
        let mut state = new_state(&config);
        let next = state.next().clone();
        state.board.lock(&next);
        let current = state.current().clone();
        let board = state.board().clone();

        assert!(matches!(
            state.try_hold(),
            Err(HoldError::PieceCollision(PieceCollisionError))
        ));
        assert_eq!(state.current(), &current);
        assert_eq!(state.next(), &next);
        assert!(state.held().is_none());
        assert!(state.can_swap_hold());
        assert_eq!(state.board(), &board);
    }

    #[test]
    fn test_lock_clears_lines_and_scores() {
        // Only the I piece on a 4-wide board: every hard drop fills a row.
        let mut config = GameConfig::builtin();
        config.game_settings.grid_width = 4;
        config.game_settings.grid_height = 6;
        config.tetrominoes.retain(|t| t.name == "I");
        let mut state = new_state(&config);
        assert_eq!(state.current().id(), PieceId::new(1).unwrap());

        assert_eq!(state.hard_drop(), 5);
        let (cleared, result) = state.lock_and_spawn();
        assert_eq!(cleared, 1);
        assert!(result.is_ok());
        assert!(state.board().is_empty());
        assert_eq!(state.stats().lines(), 1);
        assert_eq!(state.stats().score(), 100 + 5 * 2);
        assert_eq!(state.stats().line_cleared_counter()[1], 1);
    }

    #[test]
    fn test_failed_spawn_does_not_merge() {
        let mut config = GameConfig::builtin();
        config.game_settings.grid_height = 4;
        let mut state = new_state(&config);
        for _ in 0..20 {
            state.hard_drop();
            let mut expected = state.board().clone();
            expected.lock(state.current());
            expected.clear_full_lines();

            let (_, result) = state.lock_and_spawn();
            assert_eq!(state.board(), &expected);
            if result.is_err() {
                assert!(state.current_collides());
                return;
            }
        }
        panic!("stack never reached the spawn area");
    }
}
