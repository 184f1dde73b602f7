//! Search configuration and the single entry point for computer moves

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    alpha_beta::{AlphaBeta, Variant, INFINITY},
    error::{Error, Result},
    game_state::GameState,
    mcts::{Budget, Mcts, DEFAULT_EXPLORATION},
    HEIGHT, WIDTH,
};

/// The search engine and its budget
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Engine {
    AlphaBeta {
        depth: u32,
        variant: Variant,
        /// Search the root columns on the rayon thread pool
        parallel: bool,
    },
    Mcts {
        budget: Budget,
        exploration: f64,
        /// Seed for the rollout RNG, entropy if `None`
        seed: Option<u64>,
    },
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SearchConfig {
    pub engine: Engine,
}

impl SearchConfig {
    /// Sequential minimax to `depth` plies
    pub fn alpha_beta(depth: u32) -> Self {
        Self {
            engine: Engine::AlphaBeta {
                depth,
                variant: Variant::Minimax,
                parallel: false,
            },
        }
    }

    /// MCTS with a fixed number of iterations
    pub fn mcts(iterations: u32) -> Self {
        Self::mcts_with_budget(Budget::Iterations(iterations))
    }

    /// MCTS that runs until `time_limit` has passed
    pub fn mcts_timed(time_limit: Duration) -> Self {
        Self::mcts_with_budget(Budget::Deadline(time_limit))
    }

    fn mcts_with_budget(budget: Budget) -> Self {
        Self {
            engine: Engine::Mcts {
                budget,
                exploration: DEFAULT_EXPLORATION,
                seed: None,
            },
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        if let Engine::AlphaBeta { variant: v, .. } = &mut self.engine {
            *v = variant;
        }
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        if let Engine::AlphaBeta { parallel: p, .. } = &mut self.engine {
            *p = parallel;
        }
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        if let Engine::Mcts { exploration: e, .. } = &mut self.engine {
            *e = exploration;
        }
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if let Engine::Mcts { seed: s, .. } = &mut self.engine {
            *s = seed;
        }
        self
    }

    pub fn seed(&self) -> Option<u64> {
        match self.engine {
            Engine::Mcts { seed, .. } => seed,
            Engine::AlphaBeta { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.engine {
            Engine::AlphaBeta { depth, .. } if depth as usize > WIDTH * HEIGHT => {
                Err(Error::InvalidConfig {
                    message: format!(
                        "depth {} is deeper than a whole game ({} moves)",
                        depth,
                        WIDTH * HEIGHT
                    ),
                })
            }
            Engine::Mcts { exploration, .. } if !exploration.is_finite() || exploration < 0.0 => {
                Err(Error::InvalidConfig {
                    message: format!(
                        "exploration constant must be finite and non-negative, got {}",
                        exploration
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::alpha_beta(4)
    }
}

/// Chooses a column for the player to move in `state`
///
/// The engine searches on behalf of `state.current_player()`. The answer is
/// checked against the current legal columns before it is returned, so the
/// caller can play it without further validation.
pub fn choose_move(state: &GameState, config: &SearchConfig) -> Result<usize> {
    config.validate()?;
    if state.is_terminal() {
        return Err(Error::GameDecided(state.status()));
    }

    let player = state.current_player();
    let column = match config.engine {
        Engine::AlphaBeta {
            depth,
            variant,
            parallel,
        } => {
            let mut searcher = AlphaBeta::new(player).with_variant(variant);
            let result = if parallel {
                searcher.search_parallel(state.grid(), depth, true)
            } else {
                searcher.search(state.grid(), depth, -INFINITY, INFINITY, true)
            };
            result.column
        }
        Engine::Mcts {
            budget,
            exploration,
            seed,
        } => Mcts::new(exploration, seed).search(state, budget),
    };

    match column {
        Some(column) if state.grid().playable(column) => {
            debug!(%player, column, engine = ?config.engine, "move chosen");
            Ok(column)
        }
        other => {
            warn!(%player, column = ?other, "search returned no playable column");
            Err(Error::NoLegalMove)
        }
    }
}
