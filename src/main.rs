use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use rand::{rngs::StdRng, SeedableRng};

use game_2048::config::GameConfig;
use game_2048::engine::Move;
use game_2048::input::{direction_for_key, validate_player_name, Key};
use game_2048::session::{Game, Phase, Session};
use game_2048::storage::{JsonFileStore, ScoreEntry, ScoreStore};

#[derive(Parser, Debug)]
#[command(name = "game-2048", about = "Play 2048 in the terminal")]
struct Args {
    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Score file (overrides the config file)
    #[arg(long)]
    scores: Option<PathBuf>,
    /// RNG seed for a reproducible game
    #[arg(long)]
    seed: Option<u64>,
    /// Log filter used when RUST_LOG is unset, e.g. "info", "debug"
    #[arg(long, default_value = "warn")]
    log: String,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Play interactively (default)
    Play {
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the high-score table
    Scores,
    /// Delete all recorded scores
    ClearScores,
}

enum Action {
    Move(Move),
    Continue,
    Reset,
    Quit,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log.as_str())).init();

    let mut cfg = match &args.config {
        Some(path) => GameConfig::from_toml(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(path) = args.scores.clone() { cfg.scores_path = path; }
    if args.seed.is_some() { cfg.seed = args.seed; }
    let store = JsonFileStore::new(&cfg.scores_path).with_max_entries(cfg.max_scores);
    info!("using score file {}", store.path().display());

    match args.cmd.unwrap_or(Cmd::Play { name: None }) {
        Cmd::Play { name } => {
            if name.is_some() { cfg.player_name = name; }
            play(store, &cfg)
        }
        Cmd::Scores => {
            let scores = store.high_scores().context("reading scores")?;
            print_scores(&scores, scores.len());
            Ok(())
        }
        Cmd::ClearScores => {
            let mut store = store;
            store.clear().context("clearing scores")?;
            println!("Scores cleared.");
            Ok(())
        }
    }
}

fn play(store: JsonFileStore, cfg: &GameConfig) -> Result<()> {
    let rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = Game::new(store, rng);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut preset_name = cfg.player_name.clone();

    loop {
        if game.session().phase == Phase::Start {
            println!("2048 - join the tiles, get to 2048!");
            print_scores(&game.high_scores(), 5);
            let name = match preset_name.take().map(|n| validate_player_name(&n)) {
                Some(Ok(name)) => name,
                Some(Err(e)) => {
                    println!("{e}");
                    match prompt_name(&mut lines)? { Some(n) => n, None => return Ok(()) }
                }
                None => match prompt_name(&mut lines)? { Some(n) => n, None => return Ok(()) },
            };
            game.start(&name);
            render(game.session());
        }

        prompt("move [wasd/hjkl/left/right/up/down], c=continue, r=reset, q=quit> ")?;
        let Some(line) = lines.next() else { return Ok(()) };
        let line = line.context("reading input")?;
        match parse_action(line.trim()) {
            Some(Action::Quit) => return Ok(()),
            Some(Action::Reset) => {
                game.reset();
            }
            Some(Action::Continue) => {
                render(game.continue_after_win());
            }
            Some(Action::Move(dir)) => {
                render(game.move_tiles(dir));
            }
            None => println!("unrecognised input: {line:?}"),
        }
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    io::stdout().flush().context("flushing stdout")
}

fn prompt_name<B: BufRead>(lines: &mut io::Lines<B>) -> Result<Option<String>> {
    loop {
        prompt("Enter your name: ")?;
        let Some(line) = lines.next() else { return Ok(None) };
        match validate_player_name(&line.context("reading name")?) {
            Ok(name) => return Ok(Some(name)),
            Err(e) => println!("{e}"),
        }
    }
}

fn parse_action(input: &str) -> Option<Action> {
    match input.to_ascii_lowercase().as_str() {
        "q" | "quit" => Some(Action::Quit),
        "r" | "reset" => Some(Action::Reset),
        "c" | "continue" => Some(Action::Continue),
        "left" => Some(Action::Move(Move::Left)),
        "right" => Some(Action::Move(Move::Right)),
        "up" => Some(Action::Move(Move::Up)),
        "down" => Some(Action::Move(Move::Down)),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => direction_for_key(Key::Char(c)).map(Action::Move),
                _ => None,
            }
        }
    }
}

fn render(session: &Session) {
    println!("{}", session.board);
    println!(
        "Player: {} | Score: {} | Best: {}",
        session.player_name, session.score, session.best_score
    );
    match session.phase {
        Phase::Won => println!("You reached 2048! Score: {}. [c]ontinue or [r]eset", session.score),
        Phase::Lost => println!("Game over! Final score: {}. [r] to play again", session.score),
        Phase::Start | Phase::Playing => {}
    }
}

fn print_scores(scores: &[ScoreEntry], limit: usize) {
    if scores.is_empty() {
        return;
    }
    println!("High Scores");
    for (rank, entry) in scores.iter().take(limit).enumerate() {
        println!("#{:<3} {:<20} {:>8}  {}", rank + 1, entry.name, entry.score, entry.date);
    }
}
