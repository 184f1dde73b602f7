//! Depth-limited game tree search with alpha-beta pruning

use rayon::prelude::*;
use tracing::debug;

use crate::{
    grid::{Grid, Player},
    heuristic::static_value,
};

/// Bound of the search window, strictly beyond any reachable score
///
/// `i32::MIN` is never used so that every window bound can be negated.
pub const INFINITY: i32 = i32::MAX;

/// The two equivalent formulations of the search
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Variant {
    /// Alternating maximising and minimising plies
    Minimax,
    /// Every ply maximises the negated value of its children
    Negamax,
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Minimax
    }
}

/// The outcome of a search: the chosen column, if any, and the position's value
/// from the maximiser's point of view
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SearchResult {
    pub column: Option<usize>,
    pub value: i32,
}

/// A depth-limited alpha-beta searcher
///
/// # Position Scoring
/// Values are always given from the perspective of the `maximizer` passed to
/// [`AlphaBeta::new`]. A position won by the maximizer is worth
/// [`WIN_SCORE`](crate::heuristic::WIN_SCORE), a lost one the negation of that,
/// a tie 0, and a position at the depth limit its heuristic score.
///
/// # Tie-breaking
/// Columns are tried in ascending order and a later column only replaces the
/// current best on a strict improvement, so the lowest of equally good columns
/// is chosen.
#[derive(Clone, Debug)]
pub struct AlphaBeta {
    maximizer: Player,
    variant: Variant,

    /// The number of nodes searched by this `AlphaBeta` so far (for diagnostics only)
    pub node_count: usize,
}

impl AlphaBeta {
    pub fn new(maximizer: Player) -> Self {
        Self {
            maximizer,
            variant: Variant::Minimax,
            node_count: 0,
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn maximizer(&self) -> Player {
        self.maximizer
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn mover(&self, maximizing: bool) -> Player {
        if maximizing {
            self.maximizer
        } else {
            self.maximizer.opponent()
        }
    }

    /// Searches `grid` to `depth` plies within the window `(alpha, beta)`
    ///
    /// `maximizing` is true when the maximizer is to move. A terminal grid
    /// yields no column and its terminal value. A depth of 0 ranks the legal
    /// columns by the static value of the position each one leads to.
    pub fn search(
        &mut self,
        grid: &Grid,
        depth: u32,
        alpha: i32,
        beta: i32,
        maximizing: bool,
    ) -> SearchResult {
        let alpha = alpha.max(-INFINITY);
        let beta = beta.max(-INFINITY);
        let depth = depth.max(1);

        let result = self.dispatch(grid, depth, alpha, beta, maximizing);
        debug!(
            column = ?result.column,
            value = result.value,
            depth,
            nodes = self.node_count,
            variant = ?self.variant,
            "alpha-beta search finished"
        );
        result
    }

    /// Searches every root column on its own rayon worker with a full window
    ///
    /// The children are folded in ascending column order afterwards, so the
    /// column and value match the sequential [`AlphaBeta::search`] with a full window.
    pub fn search_parallel(&mut self, grid: &Grid, depth: u32, maximizing: bool) -> SearchResult {
        let depth = depth.max(1);
        if grid.is_terminal() {
            self.node_count += 1;
            return SearchResult {
                column: None,
                value: static_value(grid, self.maximizer),
            };
        }

        let mover = self.mover(maximizing);
        let template = Self {
            node_count: 0,
            ..self.clone()
        };
        let children: Vec<(usize, i32, usize)> = grid
            .valid_columns()
            .into_par_iter()
            .map(|column| {
                let mut searcher = template.clone();
                let mut child = *grid;
                child.play(column, mover);
                let value = searcher
                    .dispatch(&child, depth - 1, -INFINITY, INFINITY, !maximizing)
                    .value;
                (column, value, searcher.node_count)
            })
            .collect();

        self.node_count += 1;
        let mut best = SearchResult {
            column: None,
            value: if maximizing { -INFINITY } else { INFINITY },
        };
        for (column, value, nodes) in children {
            self.node_count += nodes;
            let improves = if maximizing {
                value > best.value
            } else {
                value < best.value
            };
            if improves {
                best = SearchResult {
                    column: Some(column),
                    value,
                };
            }
        }

        debug!(
            column = ?best.column,
            value = best.value,
            depth,
            nodes = self.node_count,
            variant = ?self.variant,
            "parallel alpha-beta search finished"
        );
        best
    }

    /// Runs the configured variant, reporting the value in minimax convention
    fn dispatch(
        &mut self,
        grid: &Grid,
        depth: u32,
        alpha: i32,
        beta: i32,
        maximizing: bool,
    ) -> SearchResult {
        match self.variant {
            Variant::Minimax => self.minimax(grid, depth, alpha, beta, maximizing),
            Variant::Negamax if maximizing => self.negamax(grid, depth, alpha, beta, true),
            Variant::Negamax => {
                // the minimising side sees the mirrored window and value
                let result = self.negamax(grid, depth, -beta, -alpha, false);
                SearchResult {
                    column: result.column,
                    value: -result.value,
                }
            }
        }
    }

    fn minimax(
        &mut self,
        grid: &Grid,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> SearchResult {
        self.node_count += 1;

        if depth == 0 || grid.is_terminal() {
            return SearchResult {
                column: None,
                value: static_value(grid, self.maximizer),
            };
        }

        let mover = self.mover(maximizing);
        let mut best = SearchResult {
            column: None,
            value: if maximizing { -INFINITY } else { INFINITY },
        };

        for column in grid.valid_columns() {
            let mut child = *grid;
            child.play(column, mover);
            let value = self
                .minimax(&child, depth - 1, alpha, beta, !maximizing)
                .value;

            if maximizing {
                if value > best.value {
                    best = SearchResult {
                        column: Some(column),
                        value,
                    };
                }
                alpha = alpha.max(best.value);
            } else {
                if value < best.value {
                    best = SearchResult {
                        column: Some(column),
                        value,
                    };
                }
                beta = beta.min(best.value);
            }
            // the other side will never let the game reach this branch
            if alpha >= beta {
                break;
            }
        }
        best
    }

    /// Negamax search; values are relative to the side to move
    fn negamax(
        &mut self,
        grid: &Grid,
        depth: u32,
        mut alpha: i32,
        beta: i32,
        maximizing: bool,
    ) -> SearchResult {
        self.node_count += 1;

        if depth == 0 || grid.is_terminal() {
            let sign = if maximizing { 1 } else { -1 };
            return SearchResult {
                column: None,
                value: sign * static_value(grid, self.maximizer),
            };
        }

        let mover = self.mover(maximizing);
        let mut best = SearchResult {
            column: None,
            value: -INFINITY,
        };

        for column in grid.valid_columns() {
            let mut child = *grid;
            child.play(column, mover);
            // the search window is flipped for the other player
            let value = -self
                .negamax(&child, depth - 1, -beta, -alpha, !maximizing)
                .value;

            if value > best.value {
                best = SearchResult {
                    column: Some(column),
                    value,
                };
            }
            alpha = alpha.max(best.value);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}
