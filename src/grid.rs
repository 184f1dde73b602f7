use std::fmt;

use crate::{
    error::{Error, Result},
    heuristic, HEIGHT, WIDTH,
};

/// One of the two sides of a game
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "Player 1"),
            Player::Two => write!(f, "Player 2"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Cell {
    PlayerOne,
    PlayerTwo,
    Empty,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn symbol(self) -> char {
        match self {
            Cell::PlayerOne => 'X',
            Cell::PlayerTwo => 'O',
            Cell::Empty => '.',
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }
}

/// The number of 4-cell windows on the board, across all four orientations
pub const NUM_WINDOWS: usize =
    HEIGHT * (WIDTH - 3) + WIDTH * (HEIGHT - 3) + 2 * (WIDTH - 3) * (HEIGHT - 3);

/// Cell indices of every 4-cell window: rows, columns, rising and falling diagonals
pub const WINDOWS: [[usize; 4]; NUM_WINDOWS] = windows();

const fn index(column: usize, row: usize) -> usize {
    column + WIDTH * row
}

const fn windows() -> [[usize; 4]; NUM_WINDOWS] {
    let mut windows = [[0; 4]; NUM_WINDOWS];
    let mut n = 0;

    // horizontal
    let mut row = 0;
    while row < HEIGHT {
        let mut column = 0;
        while column + 3 < WIDTH {
            windows[n] = [
                index(column, row),
                index(column + 1, row),
                index(column + 2, row),
                index(column + 3, row),
            ];
            n += 1;
            column += 1;
        }
        row += 1;
    }

    // vertical
    let mut column = 0;
    while column < WIDTH {
        let mut row = 0;
        while row + 3 < HEIGHT {
            windows[n] = [
                index(column, row),
                index(column, row + 1),
                index(column, row + 2),
                index(column, row + 3),
            ];
            n += 1;
            row += 1;
        }
        column += 1;
    }

    // diagonal /
    let mut row = 0;
    while row + 3 < HEIGHT {
        let mut column = 0;
        while column + 3 < WIDTH {
            windows[n] = [
                index(column, row),
                index(column + 1, row + 1),
                index(column + 2, row + 2),
                index(column + 3, row + 3),
            ];
            n += 1;
            column += 1;
        }
        row += 1;
    }

    // diagonal \
    let mut row = 3;
    while row < HEIGHT {
        let mut column = 0;
        while column + 3 < WIDTH {
            windows[n] = [
                index(column, row),
                index(column + 1, row - 1),
                index(column + 2, row - 2),
                index(column + 3, row - 3),
            ];
            n += 1;
            column += 1;
        }
        row += 1;
    }

    windows
}

/// A 7x6 gravity grid
///
/// `Grid` is `Copy`: trying a move on a copy never touches the original, so
/// search branches own their positions outright.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Grid {
    cells: [Cell; WIDTH * HEIGHT], // cells are stored left-to-right, bottom-to-top
    heights: [usize; WIDTH],
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; WIDTH * HEIGHT],
            heights: [0; WIDTH],
        }
    }

    /// Builds a grid from a string of 1-indexed columns, alternating players
    /// starting with `Player::One`
    ///
    /// Only legality of each drop is checked; moves after a win are accepted.
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut grid = Self::new();
        let mut player = Player::One;

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    grid.drop_piece(column - 1, player)?;
                    player = player.opponent();
                }
                _ => return Err(Error::InvalidMove(column_char)),
            }
        }
        Ok(grid)
    }

    /// Builds a grid from text rows, top row first
    ///
    /// `X` is `Player::One`, `O` is `Player::Two` and `.` is empty. Fewer than
    /// `HEIGHT` rows fill the bottom of the grid. Floating pieces are rejected.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        if rows.len() > HEIGHT {
            return Err(Error::InvalidGrid {
                message: format!("{} rows given, at most {} allowed", rows.len(), HEIGHT),
            });
        }
        let mut grid = Self::new();

        for (row, text) in rows.iter().rev().enumerate() {
            if text.chars().count() != WIDTH {
                return Err(Error::InvalidGrid {
                    message: format!("row '{}' must be {} cells wide", text, WIDTH),
                });
            }
            for (column, symbol) in text.chars().enumerate() {
                let cell = match symbol {
                    'X' | 'x' => Cell::PlayerOne,
                    'O' | 'o' => Cell::PlayerTwo,
                    '.' => continue,
                    other => {
                        return Err(Error::InvalidGrid {
                            message: format!("unknown cell '{}'", other),
                        })
                    }
                };
                if grid.heights[column] != row {
                    return Err(Error::InvalidGrid {
                        message: format!("floating piece in column {}", column),
                    });
                }
                grid.cells[index(column, row)] = cell;
                grid.heights[column] += 1;
            }
        }
        Ok(grid)
    }

    pub fn cell(&self, column: usize, row: usize) -> Cell {
        self.cells[index(column, row)]
    }

    /// The number of pieces in `column`
    pub fn height(&self, column: usize) -> usize {
        self.heights[column]
    }

    pub fn num_pieces(&self) -> usize {
        self.heights.iter().sum()
    }

    pub fn playable(&self, column: usize) -> bool {
        column < WIDTH && self.heights[column] < HEIGHT
    }

    /// Columns that can still take a piece, in ascending order
    pub fn valid_columns(&self) -> Vec<usize> {
        (0..WIDTH).filter(|&column| self.playable(column)).collect()
    }

    /// Places `player`'s piece in the lowest empty row of `column`, returning that row
    pub fn drop_piece(&mut self, column: usize, player: Player) -> Result<usize> {
        if column >= WIDTH {
            return Err(Error::ColumnOutOfRange { column });
        }
        if !self.playable(column) {
            return Err(Error::ColumnFull { column });
        }
        let row = self.heights[column];
        self.cells[index(column, row)] = player.into();
        self.heights[column] += 1;
        Ok(row)
    }

    /// Places `player`'s piece in `column` without checking it is playable
    ///
    /// Search code only calls this with columns taken from [`Grid::valid_columns`].
    pub fn play(&mut self, column: usize, player: Player) {
        debug_assert!(self.playable(column), "column {} is not playable", column);
        self.cells[index(column, self.heights[column])] = player.into();
        self.heights[column] += 1;
    }

    /// True iff any window holds four of `player`'s pieces
    pub fn has_won(&self, player: Player) -> bool {
        let piece = Cell::from(player);
        WINDOWS
            .iter()
            .any(|window| window.iter().all(|&i| self.cells[i] == piece))
    }

    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|&height| height == HEIGHT)
    }

    pub fn winner(&self) -> Option<Player> {
        [Player::One, Player::Two]
            .iter()
            .copied()
            .find(|&player| self.has_won(player))
    }

    /// Terminal iff a player has four in a row or the grid is full
    pub fn is_terminal(&self) -> bool {
        self.is_full() || self.winner().is_some()
    }

    pub fn window(&self, window: &[usize; 4]) -> [Cell; 4] {
        [
            self.cells[window[0]],
            self.cells[window[1]],
            self.cells[window[2]],
            self.cells[window[3]],
        ]
    }

    /// Positional evaluation of the grid for `player`, see [`heuristic::score`]
    pub fn heuristic_score(&self, player: Player) -> i32 {
        heuristic::score(self, player)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            let line: String = (0..WIDTH).map(|c| self.cell(c, row).symbol()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
