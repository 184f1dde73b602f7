use std::fmt;

use rand::Rng;

use crate::{
    error::{Error, Result},
    grid::{Grid, Player},
};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Status {
    InProgress,
    Won(Player),
    Tied,
}

impl Status {
    /// Derives the status of a grid; a win takes precedence over a full board
    pub fn of(grid: &Grid) -> Self {
        match grid.winner() {
            Some(player) => Status::Won(player),
            None if grid.is_full() => Status::Tied,
            None => Status::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::InProgress)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::InProgress => write!(f, "in progress"),
            Status::Won(player) => write!(f, "{} wins", player),
            Status::Tied => write!(f, "draw"),
        }
    }
}

/// Which piece the human plays and which the computer plays
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Roles {
    pub human: Player,
    pub computer: Player,
}

impl Roles {
    pub fn new(human: Player) -> Self {
        Self {
            human,
            computer: human.opponent(),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(if rng.gen() { Player::One } else { Player::Two })
    }
}

impl Default for Roles {
    fn default() -> Self {
        Self::new(Player::One)
    }
}

/// A game in progress: the grid, whose turn it is and who plays which piece
///
/// `Player::One` always moves first.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct GameState {
    grid: Grid,
    current_player: Player,
    roles: Roles,
    status: Status,
}

impl GameState {
    pub fn new(roles: Roles) -> Self {
        Self {
            grid: Grid::new(),
            current_player: Player::One,
            roles,
            status: Status::InProgress,
        }
    }

    /// Replays a string of 1-indexed columns from an empty board
    pub fn from_moves<S: AsRef<str>>(roles: Roles, moves: S) -> Result<Self> {
        let mut state = Self::new(roles);
        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=crate::WIDTH) => {
                    state.play(column - 1)?;
                }
                _ => return Err(Error::InvalidMove(column_char)),
            }
        }
        Ok(state)
    }

    /// Wraps an existing grid, with `current_player` to move
    pub fn from_grid(grid: Grid, current_player: Player, roles: Roles) -> Self {
        Self {
            grid,
            current_player,
            roles,
            status: Status::of(&grid),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn roles(&self) -> Roles {
        self.roles
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_computer_turn(&self) -> bool {
        self.current_player == self.roles.computer
    }

    pub fn valid_columns(&self) -> Vec<usize> {
        if self.is_terminal() {
            Vec::new()
        } else {
            self.grid.valid_columns()
        }
    }

    /// Drops the current player's piece into `column` and passes the turn
    ///
    /// Fails without touching the state if the game is already decided or
    /// the column cannot take a piece.
    pub fn play(&mut self, column: usize) -> Result<Status> {
        if self.is_terminal() {
            return Err(Error::GameDecided(self.status));
        }
        self.grid.drop_piece(column, self.current_player)?;
        self.status = Status::of(&self.grid);
        self.current_player = self.current_player.opponent();
        Ok(self.status)
    }

    /// A copy of this state with `column` played
    pub fn with_move(&self, column: usize) -> Result<Self> {
        let mut next = *self;
        next.play(column)?;
        Ok(next)
    }
}
