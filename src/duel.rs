//! Engine-vs-engine matches, played in parallel

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    error::Result,
    game_state::{GameState, Roles, Status},
    grid::Player,
    selector::{choose_move, SearchConfig},
};

/// The result of one game from the point of view of the first engine
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GameResult {
    FirstWins,
    SecondWins,
    Tie,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct DuelReport {
    pub first_wins: usize,
    pub second_wins: usize,
    pub ties: usize,
}

impl DuelReport {
    pub fn games(&self) -> usize {
        self.first_wins + self.second_wins + self.ties
    }

    fn record(&mut self, result: GameResult) {
        match result {
            GameResult::FirstWins => self.first_wins += 1,
            GameResult::SecondWins => self.second_wins += 1,
            GameResult::Tie => self.ties += 1,
        }
    }
}

/// A series of games between two engine configurations
///
/// The first engine moves first in even-numbered games and second in odd ones.
/// MCTS seeds are offset by the game number so a seeded duel is reproducible.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Duel {
    pub first: SearchConfig,
    pub second: SearchConfig,
    pub games: usize,
    pub show_progress: bool,
}

impl Duel {
    pub fn new(first: SearchConfig, second: SearchConfig, games: usize) -> Self {
        Self {
            first,
            second,
            games,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Plays a single game, `game` selecting who moves first and the seed offsets
    pub fn play_game(&self, game: usize) -> Result<GameResult> {
        let first_player = if game % 2 == 0 {
            Player::One
        } else {
            Player::Two
        };
        let offset = game as u64;
        let first = self
            .first
            .with_seed(self.first.seed().map(|s| s.wrapping_add(offset)));
        let second = self
            .second
            .with_seed(self.second.seed().map(|s| s.wrapping_add(offset)));

        // the first engine plays the "computer" role
        let mut state = GameState::new(Roles::new(first_player.opponent()));
        while !state.is_terminal() {
            let config = if state.current_player() == first_player {
                &first
            } else {
                &second
            };
            let column = choose_move(&state, config)?;
            state.play(column)?;
        }

        debug!(game, status = %state.status(), "duel game finished\n{}", state.grid());
        Ok(match state.status() {
            Status::Won(winner) if winner == first_player => GameResult::FirstWins,
            Status::Won(_) => GameResult::SecondWins,
            _ => GameResult::Tie,
        })
    }

    /// Plays every game on the rayon thread pool
    pub fn run(&self) -> Result<DuelReport> {
        let progress = if self.show_progress {
            let progress = ProgressBar::new(self.games as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("Playing games: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
                    .progress_chars("█▓▒░  "),
            );
            progress
        } else {
            ProgressBar::hidden()
        };

        let results: Vec<GameResult> = (0..self.games)
            .into_par_iter()
            .map(|game| {
                let result = self.play_game(game);
                progress.inc(1);
                result
            })
            .collect::<Result<_>>()?;
        progress.finish();

        let mut report = DuelReport::default();
        for result in results {
            report.record(result);
        }
        info!(
            first_wins = report.first_wins,
            second_wins = report.second_wins,
            ties = report.ties,
            "duel finished"
        );
        Ok(report)
    }
}
