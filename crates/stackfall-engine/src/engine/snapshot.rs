use serde::Serialize;

use crate::core::{board::Board, piece::Piece};

use super::{session::GamePhase, state::GameState};

/// Read-only view of a piece for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceView {
    pub id: u8,
    pub name: String,
    pub rotation: usize,
    pub x: i32,
    pub y: i32,
    /// Absolute board coordinates of the filled cells (may lie above the board).
    pub cells: Vec<(i32, i32)>,
}

impl From<&Piece> for PieceView {
    fn from(piece: &Piece) -> Self {
        Self {
            id: piece.id().get(),
            name: piece.definition().name().to_owned(),
            rotation: piece.rotation(),
            x: piece.x(),
            y: piece.y(),
            cells: piece.occupied_positions().collect(),
        }
    }
}

/// Everything a renderer or audio layer needs to present one frame.
///
/// Game fields, statistics included, are `None` until the first game starts.
/// Board rows hold `0` for empty cells and the piece id otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub board: Option<Vec<Vec<u8>>>,
    pub current: Option<PieceView>,
    pub ghost: Option<PieceView>,
    pub next: Option<PieceView>,
    pub hold: Option<PieceView>,
    pub can_swap_hold: bool,
    pub score: Option<u64>,
    pub level: Option<u64>,
    pub lines: Option<u64>,
    pub fall_interval_ms: Option<f64>,
    pub completed_pieces: Option<u64>,
}

fn board_rows(board: &Board) -> Vec<Vec<u8>> {
    board
        .rows()
        .map(|row| row.iter().map(|cell| cell.map_or(0, |id| id.get())).collect())
        .collect()
}

impl SessionSnapshot {
    pub(crate) fn new(phase: GamePhase, state: Option<&GameState>) -> Self {
        let Some(state) = state else {
            return Self {
                phase,
                board: None,
                current: None,
                ghost: None,
                next: None,
                hold: None,
                can_swap_hold: false,
                score: None,
                level: None,
                lines: None,
                fall_interval_ms: None,
                completed_pieces: None,
            };
        };
        let stats = state.stats();
        Self {
            phase,
            board: Some(board_rows(state.board())),
            current: Some(state.current().into()),
            ghost: Some((&state.ghost_piece()).into()),
            next: Some(state.next().into()),
            hold: state.held().map(PieceView::from),
            can_swap_hold: state.can_swap_hold(),
            score: Some(stats.score()),
            level: Some(stats.level()),
            lines: Some(stats.lines()),
            fall_interval_ms: Some(stats.fall_interval_ms()),
            completed_pieces: Some(stats.completed_pieces()),
        }
    }
}
