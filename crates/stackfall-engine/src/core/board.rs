use std::fmt;

use super::piece::{Piece, PieceId};

/// Content of a board cell: `None` when empty, otherwise the id of the locked piece.
pub type Cell = Option<PieceId>;

/// The playfield: a fixed `width × height` grid of locked cells.
///
/// Cells are stored in a flat row-major buffer (`y * width + x`), with row 0
/// at the top. Only [`Board::lock`] and [`Board::clear_full_lines`] mutate
/// the grid, and its dimensions never change after construction.
///
/// # Coordinate system
///
/// - `x` grows rightward over `0..width`
/// - `y` grows downward over `0..height`
/// - Negative `y` is the area above the board where pieces may spawn; it is
///   never stored
///
/// # Example
///
/// ```
/// use stackfall_engine::Board;
///
/// let mut board = Board::from_ascii(
///     "
///     ....
///     #.#.
///     #####
///     ",
/// );
/// assert_eq!(board.clear_full_lines(), 1);
/// assert_eq!(board.to_string(), "....\n....\n1.1.\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or does not fit in an `i32`.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "board must not be empty");
        assert!(
            i32::try_from(width).is_ok() && i32::try_from(height).is_ok(),
            "board dimensions out of range"
        );
        Self {
            width,
            height,
            cells: vec![None; width * height],
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

    /// Converts signed coordinates into a buffer index, or `None` when out of bounds.
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Returns the cell at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks_exact(self.width)
    }

    fn row(&self, y: usize) -> &[Cell] {
        &self.cells[y * self.width..][..self.width]
    }

    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height && self.row(y).iter().all(Option::is_some)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Checks whether the piece, shifted by `(dx, dy)`, would leave the board or overlap a locked cell.
    ///
    /// A cell collides when its column is outside `0..width`, when its row is
    /// at or below the floor, or when it lands on a filled cell. Cells above
    /// the board (negative row) skip the occupancy check but still respect
    /// the side walls.
    #[must_use]
    pub fn collides(&self, piece: &Piece, dx: i32, dy: i32) -> bool {
        piece.occupied_positions().any(|(x, y)| {
            let (x, y) = (x + dx, y + dy);
            let Ok(column) = usize::try_from(x) else {
                return true;
            };
            if column >= self.width {
                return true;
            }
            let Ok(row) = usize::try_from(y) else {
                return false;
            };
            row >= self.height || self.cells[row * self.width + column].is_some()
        })
    }

    /// Writes the piece id into every board cell the piece occupies.
    ///
    /// Cells above the board are dropped.
    pub fn lock(&mut self, piece: &Piece) {
        let id = piece.id();
        for (x, y) in piece.occupied_positions() {
            if let Some(idx) = self.index(x, y) {
                self.cells[idx] = Some(id);
            }
        }
    }

    /// Removes every full row and returns how many were removed.
    ///
    /// Rows are scanned bottom to top. Surviving rows move down by the number
    /// of full rows below them, keeping their relative order, and the vacated
    /// rows at the top are emptied. A board without full rows is left untouched.
    pub fn clear_full_lines(&mut self) -> usize {
        let width = self.width;
        let mut write_y = self.height;
        for read_y in (0..self.height).rev() {
            if self.is_row_full(read_y) {
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                let src = read_y * width;
                self.cells.copy_within(src..src + width, write_y * width);
            }
        }
        let cleared = write_y;
        self.cells[..cleared * width].fill(None);
        cleared
    }

    /// Creates a board from ASCII art for testing.
    ///
    /// Rows are given top to bottom; blank lines and surrounding whitespace are
    /// ignored. `.` is an empty cell, `#` is a cell of piece `1` and the digits
    /// `1`-`9` are cells of that piece id. The board takes the dimensions of the art.
    ///
    /// # Panics
    ///
    /// Panics if rows differ in length or contain other characters.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let width = lines.first().map_or(0, |line| line.chars().count());
        let mut board = Self::new(width, lines.len());

        for (y, line) in lines.iter().enumerate() {
            assert_eq!(
                line.chars().count(),
                width,
                "Each row must have exactly {width} cells, got {line:?} at row {y}",
            );
            for (x, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => None,
                    '#' => PieceId::new(1),
                    '1'..='9' => ch
                        .to_digit(10)
                        .and_then(|d| u8::try_from(d).ok())
                        .and_then(PieceId::new),
                    _ => panic!("unexpected character {ch:?} at ({x}, {y})"),
                };
                board.cells[y * width + x] = cell;
            }
        }
        board
    }
}

impl fmt::Display for Board {
    /// Renders the grid with `.` for empty cells and the piece id for filled ones.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                match cell {
                    Some(id) => write!(f, "{id}")?,
                    None => f.write_str(".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
