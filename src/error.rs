//! Error type shared by the board, the search engines and the move selector

use thiserror::Error;

use crate::{game_state::Status, WIDTH};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid move, column {column} out of range (columns are 0 to {})", WIDTH - 1)]
    ColumnOutOfRange { column: usize },

    #[error("invalid move, column {column} full")]
    ColumnFull { column: usize },

    #[error("game already decided: {0}")]
    GameDecided(Status),

    #[error("no legal move available")]
    NoLegalMove,

    #[error("could not parse '{0}' as a valid move")]
    InvalidMove(char),

    #[error("invalid grid: {message}")]
    InvalidGrid { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
