//! Search engines for playing the board game 'Connect 4'
//!
//! Two engines choose moves for a computer player: a depth-limited
//! alpha-beta search (minimax or negamax) over a positional heuristic,
//! and a Monte Carlo Tree Search driven by random rollouts.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_search::{choose_move, GameState, Roles, SearchConfig};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // player 1 has three stacked in the 4th column and is to move
//! let state = GameState::from_moves(Roles::default(), "414141")?;
//! let column = choose_move(&state, &SearchConfig::alpha_beta(4))?;
//!
//! assert_eq!(column, 3);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;

pub mod error;

pub mod grid;

pub mod heuristic;

pub mod game_state;

pub mod alpha_beta;

pub mod mcts;

pub mod selector;

pub mod duel;

mod test;

pub use alpha_beta::{AlphaBeta, SearchResult, Variant};
pub use duel::{Duel, DuelReport};
pub use error::{Error, Result};
pub use game_state::{GameState, Roles, Status};
pub use grid::{Cell, Grid, Player};
pub use mcts::{Budget, Mcts};
pub use selector::{choose_move, Engine, SearchConfig};

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

/// The middle column, favoured by the heuristic
pub const CENTER_COLUMN: usize = WIDTH / 2;

// every window table assumes at least one full line of four in each direction
const_assert!(WIDTH >= 4 && HEIGHT >= 4);
// column indices are written as single digits in move strings
const_assert!(WIDTH <= 9);
