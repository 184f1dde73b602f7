#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use proptest::prelude::*;
    use std::time::Duration;

    use crate::{
        alpha_beta::INFINITY,
        heuristic::{self, WIN_SCORE},
        mcts::{Tree, DEFAULT_EXPLORATION},
        *,
    };

    /// Replays `moves` (0-indexed), skipping full columns and stopping once the game is decided
    fn position(moves: &[usize]) -> GameState {
        let mut state = GameState::new(Roles::default());
        for &column in moves {
            if state.is_terminal() {
                break;
            }
            if state.grid().playable(column) {
                state.play(column).unwrap();
            }
        }
        state
    }

    /// A full grid without any four in a row: columns alternate bottom to top
    /// and pairs of columns start with opposite pieces
    fn tied_grid() -> Result<Grid> {
        let rows: Vec<String> = (0..HEIGHT)
            .rev()
            .map(|row| {
                (0..WIDTH)
                    .map(|column| {
                        if (row + (column / 2) % 2) % 2 == 0 {
                            'X'
                        } else {
                            'O'
                        }
                    })
                    .collect()
            })
            .collect();
        let rows: Vec<&str> = rows.iter().map(|row| row.as_str()).collect();
        Ok(Grid::from_rows(&rows)?)
    }

    fn all_searchers(maximizer: Player) -> Vec<AlphaBeta> {
        vec![
            AlphaBeta::new(maximizer),
            AlphaBeta::new(maximizer).with_variant(Variant::Negamax),
        ]
    }

    #[test]
    pub fn horizontal_win() -> Result<()> {
        let grid = Grid::from_rows(&["XXXXOOO"])?;
        assert!(grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));

        let grid = Grid::from_rows(&["XXX.XOO"])?;
        assert!(!grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));
        Ok(())
    }

    #[test]
    pub fn vertical_win() -> Result<()> {
        let grid = Grid::from_rows(&["X......", "X......", "X......", "XOOO..."])?;
        assert!(grid.has_won(Player::One));

        let grid = Grid::from_rows(&["X......", "O......", "X......", "X......", "XOO...."])?;
        assert!(!grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));
        Ok(())
    }

    #[test]
    pub fn rising_diagonal_win() -> Result<()> {
        let grid = Grid::from_rows(&[
            "...X...", //
            "..XO...", //
            ".XOO...", //
            "XOOO...",
        ])?;
        assert!(grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));

        let grid = Grid::from_rows(&[
            "....X..", //
            "..XOO..", //
            ".XOOX..", //
            "XOOXO..",
        ])?;
        assert!(!grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));
        Ok(())
    }

    #[test]
    pub fn falling_diagonal_win() -> Result<()> {
        let grid = Grid::from_rows(&[
            "...X...", //
            "...OX..", //
            "...OOX.", //
            "...OOOX",
        ])?;
        assert!(grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));

        let grid = Grid::from_rows(&[
            "..X....", //
            "..OOX..", //
            "..XOOX.", //
            "..OXOOX",
        ])?;
        assert!(!grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));
        Ok(())
    }

    #[test]
    pub fn column_three_scenario() -> Result<()> {
        let mut grid = Grid::new();
        assert_eq!(grid.drop_piece(3, Player::One)?, 0);
        assert_eq!(grid.drop_piece(2, Player::Two)?, 0);
        assert_eq!(grid.drop_piece(3, Player::One)?, 1);
        assert_eq!(grid.drop_piece(3, Player::One)?, 2);
        assert!(!grid.has_won(Player::One));

        assert_eq!(grid.drop_piece(3, Player::One)?, 3);
        assert!(grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));
        Ok(())
    }

    #[test]
    pub fn full_board_tie() -> Result<()> {
        let grid = tied_grid()?;
        assert!(grid.is_full());
        assert!(!grid.has_won(Player::One));
        assert!(!grid.has_won(Player::Two));
        assert!(grid.valid_columns().is_empty());
        assert_eq!(Status::of(&grid), Status::Tied);

        for &maximizer in &[Player::One, Player::Two] {
            for mut searcher in all_searchers(maximizer) {
                let result = searcher.search(&grid, 4, -INFINITY, INFINITY, true);
                assert_eq!(
                    result,
                    SearchResult {
                        column: None,
                        value: 0
                    }
                );
            }
        }

        let state = GameState::from_grid(grid, Player::One, Roles::default());
        assert_eq!(
            choose_move(&state, &SearchConfig::alpha_beta(4)),
            Err(Error::GameDecided(Status::Tied))
        );
        assert_eq!(
            choose_move(&state, &SearchConfig::mcts(100)),
            Err(Error::GameDecided(Status::Tied))
        );
        Ok(())
    }

    #[test]
    pub fn terminal_values_are_zero_sum() -> Result<()> {
        let won = Grid::from_rows(&["O......", "XXXXOO."])?;
        assert!(won.has_won(Player::One));

        for &maximizing in &[true, false] {
            for (mut one, mut two) in all_searchers(Player::One)
                .into_iter()
                .zip(all_searchers(Player::Two))
            {
                let for_one = one.search(&won, 3, -INFINITY, INFINITY, maximizing);
                let for_two = two.search(&won, 3, -INFINITY, INFINITY, maximizing);
                assert_eq!(for_one.column, None);
                assert_eq!(for_one.value, WIN_SCORE);
                assert_eq!(for_two.value, -WIN_SCORE);
                assert_eq!(for_one.value, -for_two.value);
            }
        }
        Ok(())
    }

    #[test]
    pub fn heuristic_of_empty_grid_is_zero() {
        let grid = Grid::new();
        assert_eq!(grid.heuristic_score(Player::One), 0);
        assert_eq!(grid.heuristic_score(Player::Two), 0);
    }

    #[test]
    pub fn heuristic_center_bonus() -> Result<()> {
        let grid = Grid::from_moves("4")?;
        assert_eq!(grid.heuristic_score(Player::One), 3);
        assert_eq!(grid.heuristic_score(Player::Two), 0);
        Ok(())
    }

    #[test]
    pub fn heuristic_windows() -> Result<()> {
        // one open three (+10) and one open two (+5) for X, an open three to block for O
        let grid = Grid::from_rows(&["XXX...."])?;
        assert_eq!(grid.heuristic_score(Player::One), 15);
        assert_eq!(grid.heuristic_score(Player::Two), -80);

        // mixed windows are worth nothing
        let mixed = [Cell::PlayerOne, Cell::PlayerTwo, Cell::PlayerOne, Cell::PlayerTwo];
        assert_eq!(heuristic::evaluate_window(mixed, Player::One), 0);
        assert_eq!(heuristic::evaluate_window(mixed, Player::Two), 0);

        let four = [Cell::PlayerTwo; 4];
        assert_eq!(heuristic::evaluate_window(four, Player::Two), 100);
        Ok(())
    }

    #[test]
    pub fn valid_columns_are_ascending() -> Result<()> {
        assert_eq!(Grid::new().valid_columns(), (0..WIDTH).collect::<Vec<_>>());

        let grid = Grid::from_moves("444444")?;
        assert_eq!(grid.valid_columns(), vec![0, 1, 2, 4, 5, 6]);
        Ok(())
    }

    #[test]
    pub fn illegal_drops_leave_grid_untouched() -> Result<()> {
        let mut grid = Grid::from_moves("111111")?;
        let before = grid;

        assert_eq!(
            grid.drop_piece(0, Player::One),
            Err(Error::ColumnFull { column: 0 })
        );
        assert_eq!(
            grid.drop_piece(WIDTH, Player::One),
            Err(Error::ColumnOutOfRange { column: WIDTH })
        );
        assert_eq!(grid, before);
        Ok(())
    }

    #[test]
    pub fn parsing_errors() {
        assert_eq!(Grid::from_moves("12a"), Err(Error::InvalidMove('a')));
        assert_eq!(Grid::from_moves("8"), Err(Error::InvalidMove('8')));
        assert_eq!(
            Grid::from_moves("1111111"),
            Err(Error::ColumnFull { column: 0 })
        );
        assert!(matches!(
            Grid::from_rows(&["X......", "......."]),
            Err(Error::InvalidGrid { .. })
        ));
        assert!(matches!(
            Grid::from_rows(&["XX"]),
            Err(Error::InvalidGrid { .. })
        ));
    }

    #[test]
    pub fn game_state_tracks_turns_and_status() -> Result<()> {
        let mut state = GameState::new(Roles::new(Player::One));
        assert_eq!(state.current_player(), Player::One);
        assert!(!state.is_computer_turn());

        assert_eq!(state.play(3)?, Status::InProgress);
        assert_eq!(state.current_player(), Player::Two);
        assert!(state.is_computer_turn());

        let state = GameState::from_moves(Roles::default(), "4343434")?;
        assert_eq!(state.status(), Status::Won(Player::One));
        assert!(state.valid_columns().is_empty());
        Ok(())
    }

    #[test]
    pub fn decided_games_reject_moves() -> Result<()> {
        let mut state = GameState::from_moves(Roles::default(), "4343434")?;
        let won = Status::Won(Player::One);

        assert_eq!(state.play(0), Err(Error::GameDecided(won)));
        assert_eq!(
            choose_move(&state, &SearchConfig::alpha_beta(3)),
            Err(Error::GameDecided(won))
        );
        assert_eq!(
            GameState::from_moves(Roles::default(), "43434341"),
            Err(Error::GameDecided(won))
        );
        Ok(())
    }

    #[test]
    pub fn with_move_copies() -> Result<()> {
        let state = GameState::new(Roles::default());
        let next = state.with_move(3)?;

        assert_eq!(state.grid().num_pieces(), 0);
        assert_eq!(next.grid().num_pieces(), 1);
        assert_eq!(next.grid().cell(3, 0), Cell::PlayerOne);
        Ok(())
    }

    #[test]
    pub fn alpha_beta_takes_the_win() -> Result<()> {
        // player 1 has three stacked in column 3, player 2 three in column 0
        let grid = Grid::from_moves("414141")?;

        for depth in 1..=4 {
            for mut searcher in all_searchers(Player::One) {
                for _ in 0..3 {
                    let result = searcher.search(&grid, depth, -INFINITY, INFINITY, true);
                    assert_eq!(
                        result,
                        SearchResult {
                            column: Some(3),
                            value: WIN_SCORE
                        }
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn alpha_beta_blocks_the_loss() -> Result<()> {
        // player 2 threatens to complete column 0
        let state = GameState::from_moves(Roles::new(Player::Two), "717161")?;
        assert_eq!(state.current_player(), Player::One);

        for &depth in &[2, 4] {
            for &variant in &[Variant::Minimax, Variant::Negamax] {
                let config = SearchConfig::alpha_beta(depth).with_variant(variant);
                for _ in 0..3 {
                    assert_eq!(choose_move(&state, &config)?, 0);
                }
                assert_eq!(choose_move(&state, &config.with_parallel(true))?, 0);
            }
        }
        Ok(())
    }

    #[test]
    pub fn depth_zero_ranks_by_heuristic() -> Result<()> {
        let grid = Grid::new();
        let mut searcher = AlphaBeta::new(Player::One);
        let result = searcher.search(&grid, 0, -INFINITY, INFINITY, true);

        // only the center column scores on an empty board
        assert_eq!(result.column, Some(3));
        assert_eq!(result.value, 3);

        let state = GameState::new(Roles::default());
        assert_eq!(choose_move(&state, &SearchConfig::alpha_beta(0))?, 3);
        Ok(())
    }

    #[test]
    pub fn lowest_column_wins_ties() -> Result<()> {
        // every first move of player 2 on a board with one center piece is scored
        // from player 1's point of view; equal values must resolve to the lowest column
        let grid = Grid::from_moves("4")?;
        let mut searcher = AlphaBeta::new(Player::One);
        let result = searcher.search(&grid, 1, -INFINITY, INFINITY, false);

        let values: Vec<i32> = grid
            .valid_columns()
            .into_iter()
            .map(|column| {
                let mut child = grid;
                child.play(column, Player::Two);
                heuristic::static_value(&child, Player::One)
            })
            .collect();
        let best = values.iter().copied().min().unwrap();
        let first = values.iter().position(|&v| v == best).unwrap();

        assert_eq!(result.column, Some(first));
        assert_eq!(result.value, best);
        Ok(())
    }

    #[test]
    pub fn mcts_takes_the_win() -> Result<()> {
        let state = GameState::from_moves(Roles::default(), "414141")?;
        let config = SearchConfig::mcts(1000).with_seed(Some(42));

        assert_eq!(choose_move(&state, &config)?, 3);
        Ok(())
    }

    #[test]
    pub fn mcts_blocks_the_loss() -> Result<()> {
        let state = GameState::from_moves(Roles::new(Player::Two), "717161")?;
        let config = SearchConfig::mcts(5000).with_seed(Some(7));

        assert_eq!(choose_move(&state, &config)?, 0);
        Ok(())
    }

    #[test]
    pub fn mcts_visit_accounting() -> Result<()> {
        let state = GameState::from_moves(Roles::default(), "4455")?;
        let iterations = 500;
        let tree = Mcts::new(DEFAULT_EXPLORATION, Some(3)).run(&state, Budget::Iterations(iterations));

        let root = tree.get(tree.root());
        let child_visits: u32 = root.children.iter().map(|&c| tree.get(c).visits).sum();
        assert_eq!(root.visits, iterations);
        assert_eq!(child_visits, iterations);
        assert!(root.is_fully_expanded());

        check_tree_invariants(&tree);
        Ok(())
    }

    fn check_tree_invariants(tree: &Tree) {
        for (id, node) in tree.nodes() {
            let legal = node.state.valid_columns();
            let mut columns: Vec<usize> = node
                .children
                .iter()
                .map(|&c| tree.get(c).column.unwrap())
                .chain(node.unexplored().iter().copied())
                .collect();
            columns.sort_unstable();
            let before = columns.len();
            columns.dedup();

            // every column is a child or unexplored, never both
            assert_eq!(columns.len(), before);
            assert_eq!(columns, legal);
            assert!(node.children.len() <= legal.len());

            for &child in &node.children {
                assert_eq!(tree.get(child).parent, Some(id));
            }

            let child_visits: u32 = node.children.iter().map(|&c| tree.get(c).visits).sum();
            if id == tree.root() {
                assert_eq!(node.visits, child_visits);
            } else if !node.state.is_terminal() {
                // one visit for the rollout at creation, the rest pass through to a child
                assert_eq!(node.visits, child_visits + 1);
            } else {
                assert!(node.children.is_empty());
                assert!(node.visits >= 1);
            }
        }
    }

    #[test]
    pub fn mcts_zero_budget_still_moves() -> Result<()> {
        let state = GameState::from_moves(Roles::default(), "444444")?;

        for _ in 0..10 {
            let column = choose_move(&state, &SearchConfig::mcts(0))?;
            assert!(state.grid().playable(column));
            assert_ne!(column, 3);
        }
        Ok(())
    }

    #[test]
    pub fn mcts_deadline_budget() -> Result<()> {
        let state = GameState::new(Roles::default());
        let config = SearchConfig::mcts_timed(Duration::from_millis(20)).with_seed(Some(1));

        let column = choose_move(&state, &config)?;
        assert!(state.grid().playable(column));
        Ok(())
    }

    #[test]
    pub fn seeded_mcts_is_reproducible() -> Result<()> {
        let state = GameState::from_moves(Roles::default(), "43")?;
        let mut first = Mcts::new(DEFAULT_EXPLORATION, Some(11));
        let mut second = Mcts::new(DEFAULT_EXPLORATION, Some(11));

        let a = first.run(&state, Budget::Iterations(300));
        let b = second.run(&state, Budget::Iterations(300));
        let visits = |tree: &Tree| -> Vec<u32> {
            tree.get(tree.root())
                .children
                .iter()
                .map(|&c| tree.get(c).visits)
                .collect()
        };
        assert_eq!(visits(&a), visits(&b));
        assert_eq!(a.best_column(), b.best_column());
        Ok(())
    }

    #[test]
    pub fn invalid_configs_are_rejected() {
        let state = GameState::new(Roles::default());

        assert!(matches!(
            choose_move(&state, &SearchConfig::alpha_beta(43)),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            choose_move(&state, &SearchConfig::mcts(10).with_exploration(f64::NAN)),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            choose_move(&state, &SearchConfig::mcts(10).with_exploration(-1.0)),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    pub fn duel_plays_every_game() -> Result<()> {
        let duel = Duel::new(
            SearchConfig::alpha_beta(2),
            SearchConfig::mcts(50).with_seed(Some(5)),
            4,
        );
        let report = duel.run()?;
        assert_eq!(report.games(), 4);
        Ok(())
    }

    proptest! {
        #[test]
        fn minimax_and_negamax_agree(
            moves in prop::collection::vec(0..WIDTH, 0..30),
            depth in 0u32..=4,
            maximizing in any::<bool>(),
            one in any::<bool>(),
        ) {
            let state = position(&moves);
            let maximizer = if one { Player::One } else { Player::Two };

            let mut minimax = AlphaBeta::new(maximizer);
            let mut negamax = AlphaBeta::new(maximizer).with_variant(Variant::Negamax);
            let a = minimax.search(state.grid(), depth, -INFINITY, INFINITY, maximizing);
            let b = negamax.search(state.grid(), depth, -INFINITY, INFINITY, maximizing);

            prop_assert_eq!(a, b);
            prop_assert_eq!(minimax.node_count, negamax.node_count);
        }

        #[test]
        fn parallel_matches_sequential(
            moves in prop::collection::vec(0..WIDTH, 0..30),
            depth in 0u32..=3,
            maximizing in any::<bool>(),
            negamax in any::<bool>(),
        ) {
            let state = position(&moves);
            let variant = if negamax { Variant::Negamax } else { Variant::Minimax };

            let mut sequential = AlphaBeta::new(Player::One).with_variant(variant);
            let mut parallel = AlphaBeta::new(Player::One).with_variant(variant);
            let a = sequential.search(state.grid(), depth, -INFINITY, INFINITY, maximizing);
            let b = parallel.search_parallel(state.grid(), depth, maximizing);

            prop_assert_eq!(a, b);
        }

        #[test]
        fn chosen_moves_are_legal(
            moves in prop::collection::vec(0..WIDTH, 0..40),
            seed in any::<u64>(),
        ) {
            let state = position(&moves);
            prop_assume!(!state.is_terminal());

            for config in &[
                SearchConfig::alpha_beta(2),
                SearchConfig::mcts(30).with_seed(Some(seed)),
            ] {
                let column = choose_move(&state, config)
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;
                prop_assert!(state.grid().playable(column));
            }
        }
    }
}
