use std::{fmt, num::NonZeroU8, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GameConfig, TetrominoConfig};

/// Identifier of a piece kind.
///
/// Ids are always non-zero: the same value is written into board cells when a
/// piece locks, and `0` is reserved for empty cells.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
#[display("{_0}")]
pub struct PieceId(NonZeroU8);

impl PieceId {
    /// Creates an id, returning `None` for the reserved value `0`.
    #[must_use]
    pub const fn new(id: u8) -> Option<Self> {
        match NonZeroU8::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0.get()
    }
}

/// One rotation state of a piece.
///
/// Stores the bounding box of the source matrix and the offsets of its filled
/// cells relative to the top-left corner. Ragged source rows are padded with
/// empty cells up to the longest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMatrix {
    width: usize,
    height: usize,
    filled: Vec<(i32, i32)>,
}

impl ShapeMatrix {
    /// Builds a matrix from rows of numbers; any non-zero number is a filled cell.
    ///
    /// # Panics
    ///
    /// Panics if a dimension does not fit in an `i32`.
    #[must_use]
    pub fn from_rows<R>(rows: &[R]) -> Self
    where
        R: AsRef<[u32]>,
    {
        let height = rows.len();
        let width = rows.iter().map(|row| row.as_ref().len()).max().unwrap_or(0);
        let filled = rows
            .iter()
            .enumerate()
            .flat_map(|(dy, row)| {
                row.as_ref()
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| **cell != 0)
                    .map(move |(dx, _)| {
                        (
                            i32::try_from(dx).expect("shape column out of range"),
                            i32::try_from(dy).expect("shape row out of range"),
                        )
                    })
            })
            .collect();
        Self {
            width,
            height,
            filled,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the `(dx, dy)` offsets of the filled cells, row by row.
    pub fn filled_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.filled.iter().copied()
    }

    #[must_use]
    pub fn is_filled(&self, dx: i32, dy: i32) -> bool {
        self.filled.contains(&(dx, dy))
    }
}

/// Immutable shape data for one piece kind, shared by every live [`Piece`] of that kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceDefinition {
    id: PieceId,
    name: String,
    rotations: Vec<ShapeMatrix>,
    spawn_offset: (i32, i32),
}

impl PieceDefinition {
    /// Builds a definition from its configuration source.
    pub fn from_config(source: &TetrominoConfig) -> Result<Self, ConfigError> {
        if source.shapes.is_empty() {
            return Err(ConfigError::EmptyRotations { id: source.id });
        }
        let rotations = source
            .shapes
            .iter()
            .map(|rows| ShapeMatrix::from_rows(rows))
            .collect();
        Ok(Self {
            id: source.id,
            name: source.name.clone(),
            rotations,
            spawn_offset: (source.spawn_offset_x, source.spawn_offset_y),
        })
    }

    #[must_use]
    pub fn id(&self) -> PieceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rotation states; always at least one.
    #[must_use]
    pub fn rotation_count(&self) -> usize {
        self.rotations.len()
    }

    #[must_use]
    pub fn shape(&self, rotation: usize) -> &ShapeMatrix {
        &self.rotations[rotation % self.rotations.len()]
    }

    #[must_use]
    pub fn spawn_offset(&self) -> (i32, i32) {
        self.spawn_offset
    }
}

/// All piece kinds of a game, in configuration order.
///
/// # Example
///
/// ```
/// use stackfall_engine::{GameConfig, PieceId, PieceRegistry};
///
/// let registry = PieceRegistry::from_config(&GameConfig::builtin()).unwrap();
/// assert_eq!(registry.len(), 7);
///
/// let t = registry.get(PieceId::new(3).unwrap()).unwrap();
/// assert_eq!(t.name(), "T");
/// assert_eq!(t.rotation_count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PieceRegistry {
    definitions: Vec<Arc<PieceDefinition>>,
}

impl PieceRegistry {
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        if config.tetrominoes.is_empty() {
            return Err(ConfigError::NoPieces);
        }
        let board_width = config.game_settings.grid_width;
        let mut definitions: Vec<Arc<PieceDefinition>> =
            Vec::with_capacity(config.tetrominoes.len());
        for source in &config.tetrominoes {
            if definitions.iter().any(|def| def.id == source.id) {
                return Err(ConfigError::DuplicateId { id: source.id });
            }
            let definition = PieceDefinition::from_config(source)?;
            if definition
                .rotations
                .iter()
                .any(|shape| shape.width() > board_width)
            {
                log::warn!(
                    "tetromino {} ({}) is wider than the {board_width}-column board",
                    definition.id,
                    definition.name,
                );
            }
            definitions.push(Arc::new(definition));
        }
        Ok(Self { definitions })
    }

    /// Number of distinct piece kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: PieceId) -> Option<&Arc<PieceDefinition>> {
        self.definitions.iter().find(|def| def.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: PieceId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PieceDefinition>> + '_ {
        self.definitions.iter()
    }
}

/// A live piece: kind, rotation state and board position.
///
/// `x` and `y` are the board coordinates of the shape matrix's top-left
/// corner and may be negative (pieces spawn partially above the board).
/// Cloning is cheap: the shape data is shared through the definition.
///
/// # Example
///
/// ```
/// use stackfall_engine::{GameConfig, Piece, PieceRegistry};
///
/// let registry = PieceRegistry::from_config(&GameConfig::builtin()).unwrap();
/// let t = registry.iter().find(|def| def.name() == "T").unwrap();
///
/// let piece = Piece::spawned(t.clone(), 10);
/// assert_eq!((piece.x(), piece.y()), (4, 0));
///
/// let moved = piece.shifted(1, 0).rotated();
/// assert_eq!(moved.to_string(), "T#1@5,0");
/// ```
#[derive(Debug, Clone)]
pub struct Piece {
    definition: Arc<PieceDefinition>,
    rotation: usize,
    x: i32,
    y: i32,
}

impl PartialEq for Piece {
    fn eq(&self, other: &Self) -> bool {
        self.definition.id == other.definition.id
            && self.rotation == other.rotation
            && self.x == other.x
            && self.y == other.y
    }
}

impl Eq for Piece {}

impl fmt::Display for Piece {
    // Format: "name#rotation@x,y" (e.g. "S#1@4,18")
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}@{},{}",
            self.definition.name, self.rotation, self.x, self.y
        )
    }
}

impl Piece {
    /// Creates a piece at the display origin `(0, 0)` in its first rotation state.
    #[must_use]
    pub fn new(definition: Arc<PieceDefinition>) -> Self {
        Self {
            definition,
            rotation: 0,
            x: 0,
            y: 0,
        }
    }

    /// Creates a piece at its spawn position on a board of the given width.
    ///
    /// The spawn column is the board's middle column (rounded down) plus the
    /// definition's horizontal spawn offset; the spawn row is the vertical offset.
    #[must_use]
    pub fn spawned(definition: Arc<PieceDefinition>, board_width: usize) -> Self {
        let (dx, dy) = definition.spawn_offset;
        let center = i32::try_from(board_width / 2).expect("board width out of range");
        Self {
            definition,
            rotation: 0,
            x: center + dx,
            y: dy,
        }
    }

    #[must_use]
    pub fn definition(&self) -> &Arc<PieceDefinition> {
        &self.definition
    }

    #[must_use]
    pub fn id(&self) -> PieceId {
        self.definition.id
    }

    #[must_use]
    pub fn rotation(&self) -> usize {
        self.rotation
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Shape of the current rotation state.
    #[must_use]
    pub fn shape(&self) -> &ShapeMatrix {
        self.definition.shape(self.rotation)
    }

    /// Returns the board coordinates of every filled cell.
    pub fn occupied_positions(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape()
            .filled_cells()
            .map(move |(dx, dy)| (self.x + dx, self.y + dy))
    }

    #[must_use]
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            rotation: self.rotation,
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Returns the piece advanced to its next rotation state, wrapping around.
    #[must_use]
    pub fn rotated(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            rotation: (self.rotation + 1) % self.definition.rotation_count(),
            x: self.x,
            y: self.y,
        }
    }

    pub(crate) fn set_placement(&mut self, rotation: usize, x: i32, y: i32) {
        self.rotation = rotation;
        self.x = x;
        self.y = y;
    }

    /// Returns a copy in rotation state 0 at the display origin, as shown in the hold slot.
    #[must_use]
    pub fn at_display_origin(&self) -> Self {
        Self::new(Arc::clone(&self.definition))
    }

    /// Returns a copy in rotation state 0 at its spawn position.
    #[must_use]
    pub fn respawned(&self, board_width: usize) -> Self {
        Self::spawned(Arc::clone(&self.definition), board_width)
    }
}
