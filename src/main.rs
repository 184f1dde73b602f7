use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::HumanDuration;
use rand::thread_rng;
use tracing::info;

use std::io::{stdin, stdout, Write};
use std::time::{Duration, Instant};

use connect4_search::{mcts::DEFAULT_EXPLORATION, *};

mod display;

/// Play Connect 4 against an alpha-beta or Monte Carlo tree search engine
#[derive(Parser, Debug)]
#[command(name = "connect4")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Engine used for the computer's moves and for hints
    #[arg(long, value_enum, default_value_t = EngineKind::AlphaBeta)]
    engine: EngineKind,

    /// Alpha-beta search depth in plies
    #[arg(long, default_value_t = 4)]
    depth: u32,

    /// MCTS iterations per move
    #[arg(long, default_value_t = 2000)]
    iterations: u32,

    /// Give MCTS a wall-clock budget per move instead of an iteration count
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Use the negamax formulation of alpha-beta
    #[arg(long)]
    negamax: bool,

    /// Search alpha-beta root columns in parallel
    #[arg(long)]
    parallel: bool,

    /// MCTS exploration constant
    #[arg(long, default_value_t = DEFAULT_EXPLORATION)]
    exploration: f64,

    /// Seed for MCTS rollouts
    #[arg(long)]
    seed: Option<u64>,

    /// The piece the human plays (player 1 moves first); random if omitted
    #[arg(long, value_enum)]
    human: Option<Side>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play alpha-beta against MCTS and report the results
    Duel {
        #[arg(long, default_value_t = 20)]
        games: usize,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum EngineKind {
    AlphaBeta,
    Mcts,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum Side {
    One,
    Two,
}

impl Args {
    fn alpha_beta_config(&self) -> SearchConfig {
        let variant = if self.negamax {
            Variant::Negamax
        } else {
            Variant::Minimax
        };
        SearchConfig::alpha_beta(self.depth)
            .with_variant(variant)
            .with_parallel(self.parallel)
    }

    fn mcts_config(&self) -> SearchConfig {
        let config = match self.time_limit_ms {
            Some(ms) => SearchConfig::mcts_timed(Duration::from_millis(ms)),
            None => SearchConfig::mcts(self.iterations),
        };
        config
            .with_exploration(self.exploration)
            .with_seed(self.seed)
    }

    fn search_config(&self) -> SearchConfig {
        match self.engine {
            EngineKind::AlphaBeta => self.alpha_beta_config(),
            EngineKind::Mcts => self.mcts_config(),
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // logs go to stderr so they don't interleave with the board
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match &args.command {
        Some(Command::Duel { games }) => duel(&args, *games),
        None => play(&args),
    }
}

fn play(args: &Args) -> Result<()> {
    let config = args.search_config();
    config.validate()?;

    let roles = match args.human {
        Some(Side::One) => Roles::new(Player::One),
        Some(Side::Two) => Roles::new(Player::Two),
        None => Roles::random(&mut thread_rng()),
    };
    info!(human = %roles.human, computer = %roles.computer, engine = ?config.engine, "new game");

    let stdin = stdin();
    let mut state = GameState::new(roles);

    println!("Welcome to Connect 4\n");
    println!(
        "You are {} ({}), {} moves first",
        roles.human,
        if roles.human == Player::One { "red" } else { "yellow" },
        Player::One
    );

    // game loop
    loop {
        display::draw(state.grid())?;

        match state.status() {
            Status::InProgress => {}
            Status::Won(winner) if winner == roles.human => {
                println!("You win!");
                break;
            }
            Status::Won(_) => {
                println!("Computer wins!");
                break;
            }
            Status::Tied => {
                println!("Draw!");
                break;
            }
        }

        let column = if state.is_computer_turn() {
            println!("AI is thinking...");
            stdout().flush()?;

            let column = choose_move(&state, &config)?;
            println!("AI selects column {}", column + 1);
            column
        } else {
            print!("Move input (1-{}, h for a hint) > ", WIDTH);
            stdout().flush()?;

            let mut input_str = String::new();
            if stdin.read_line(&mut input_str)? == 0 {
                // end of input
                return Ok(());
            }
            let input = input_str.trim();

            if input.eq_ignore_ascii_case("h") {
                let hint = choose_move(&state, &config)?;
                println!("Hint: column {}", hint + 1);
                continue;
            }
            match input.parse::<usize>() {
                Ok(column @ 1..=WIDTH) => column - 1,
                _ => {
                    println!("Invalid column: {}", input);
                    continue;
                }
            }
        };

        if let Err(err) = state.play(column) {
            println!("{}", err);
            // try the move again
            continue;
        }
    }
    Ok(())
}

fn duel(args: &Args, games: usize) -> Result<()> {
    let alpha_beta = args.alpha_beta_config();
    let mcts = args.mcts_config();
    alpha_beta.validate()?;
    mcts.validate()?;

    println!(
        "Playing {} games: alpha-beta (depth {}) vs MCTS",
        games, args.depth
    );
    let start = Instant::now();
    let report = Duel::new(alpha_beta, mcts, games)
        .with_progress(true)
        .run()?;

    println!(
        "Alpha-beta wins: {}, MCTS wins: {}, draws: {}",
        report.first_wins, report.second_wins, report.ties
    );
    println!("Duel completed in {}", HumanDuration(start.elapsed()));
    Ok(())
}
