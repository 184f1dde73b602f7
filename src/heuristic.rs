//! Static evaluation of non-terminal positions
//!
//! The score only ever matters relative to other heuristic scores, and stays
//! far below [`WIN_SCORE`] so that forced wins and losses always dominate.

use crate::{
    grid::{Cell, Grid, Player, WINDOWS},
    CENTER_COLUMN, HEIGHT,
};

/// The value of a won position for the side being maximised
pub const WIN_SCORE: i32 = 1_000_000;

/// The value of a tied position
pub const TIE_SCORE: i32 = 0;

const CENTER_WEIGHT: i32 = 3;
const FOUR: i32 = 100;
const THREE: i32 = 10;
const TWO: i32 = 5;
const OPPONENT_THREE: i32 = -80;

/// Scores a single 4-cell window for `player`
pub fn evaluate_window(window: [Cell; 4], player: Player) -> i32 {
    let piece = Cell::from(player);
    let opponent = Cell::from(player.opponent());

    let own = window.iter().filter(|&&c| c == piece).count();
    let theirs = window.iter().filter(|&&c| c == opponent).count();
    let empty = window.iter().filter(|c| c.is_empty()).count();

    let mut score = match (own, empty) {
        (4, _) => FOUR,
        (3, 1) => THREE,
        (2, 2) => TWO,
        _ => 0,
    };
    // an open three for the opponent is a threat that has to be blocked
    if theirs == 3 && empty == 1 {
        score += OPPONENT_THREE;
    }
    score
}

/// Positional score of `grid` for `player`: a bonus per piece in the center
/// column plus the sum of [`evaluate_window`] over every window
pub fn score(grid: &Grid, player: Player) -> i32 {
    let piece = Cell::from(player);
    let center = (0..HEIGHT)
        .filter(|&row| grid.cell(CENTER_COLUMN, row) == piece)
        .count() as i32;

    let windows: i32 = WINDOWS
        .iter()
        .map(|window| evaluate_window(grid.window(window), player))
        .sum();

    center * CENTER_WEIGHT + windows
}

/// Value of a terminal grid for `maximizer`, or `None` if the game goes on
pub fn terminal_value(grid: &Grid, maximizer: Player) -> Option<i32> {
    if grid.has_won(maximizer) {
        Some(WIN_SCORE)
    } else if grid.has_won(maximizer.opponent()) {
        Some(-WIN_SCORE)
    } else if grid.is_full() {
        Some(TIE_SCORE)
    } else {
        None
    }
}

/// Terminal value if the game is over, else the heuristic score, both for `maximizer`
pub fn static_value(grid: &Grid, maximizer: Player) -> i32 {
    terminal_value(grid, maximizer).unwrap_or_else(|| score(grid, maximizer))
}
