use std::{fs, path::PathBuf, thread, time::Duration};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use waifudle::{
    game::{Event, Game},
    opponent::{Deduction, Stupid},
    record::{facts_for, MemoryStore, RecordStore},
    session::{Outcome, Phase},
    source::JsonSource,
    Author, CandidateSource, Harness, Opponent, Pool,
};

/// Benchmark waifudle opponents, or watch them play a duel.
#[derive(Debug, Parser)]
#[command(name = "waifudle", author, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run opponents against many targets and report how they did.
    Bench(BenchArgs),

    /// Play a paced duel with one opponent standing in for the player.
    Duel(DuelArgs),
}

#[derive(Debug, Args)]
struct PoolArgs {
    /// Path to a JSON array of entities.
    #[arg(short, long, value_name = "FILE", default_value = "data/pool.json")]
    dataset: PathBuf,

    /// Only play with entities from this source.
    #[arg(short, long)]
    theme: Option<String>,
}

#[derive(Debug, Args)]
struct BenchArgs {
    #[command(flatten)]
    pool: PoolArgs,

    /// Number of random targets to play against.
    #[arg(short, long, default_value_t = 100, conflicts_with = "all")]
    games: usize,

    /// Play against every target in the pool.
    #[arg(long)]
    all: bool,

    /// Guesses an opponent gets before a game counts as lost.
    #[arg(long, default_value_t = 50)]
    max_guesses: usize,

    /// Show a progress bar and a table of every game.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct DuelArgs {
    #[command(flatten)]
    pool: PoolArgs,

    /// Opponent guessing on behalf of the player.
    #[arg(long, value_enum, default_value_t = Kind::Deduction)]
    player: Kind,

    /// The computer opponent.
    #[arg(long, value_enum, default_value_t = Kind::Deduction)]
    opponent: Kind,

    /// Who guesses first.
    #[arg(long, value_enum, default_value_t = First::Player)]
    first: First,

    /// Seed for the target and both sides' choices.
    #[arg(long)]
    seed: Option<u64>,

    /// Wait out the reveal and thinking delays instead of skipping them.
    #[arg(long)]
    realtime: bool,

    /// Write a snapshot of the finished session to this file.
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Deduction,
    Stupid,
}

impl Kind {
    fn build(self) -> Box<dyn Opponent> {
        match self {
            Kind::Deduction => Box::new(Deduction),
            Kind::Stupid => Box::new(Stupid),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum First {
    Player,
    Opponent,
}

impl From<First> for Author {
    fn from(first: First) -> Self {
        match first {
            First::Player => Author::Player,
            First::Opponent => Author::Opponent,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Bench(args) => bench(args),
        Command::Duel(args) => duel(args),
    }
}

fn load(args: &PoolArgs) -> anyhow::Result<Pool> {
    let source = JsonSource::open(&args.dataset)
        .with_context(|| format!("failed to read dataset {}", args.dataset.display()))?;
    let pool = source.pool(args.theme.as_deref())?;
    info!("loaded {} entities from {}", pool.len(), args.dataset.display());
    Ok(pool)
}

fn bench(args: BenchArgs) -> anyhow::Result<()> {
    let pool = load(&args.pool)?;

    let mut harness = Harness::new()
        .add_opponent(Box::new(Deduction))
        .add_baseline(Box::new(Stupid))
        .max_guesses(args.max_guesses);
    harness = if args.all {
        harness.test_all()
    } else {
        harness.test_num(args.games)
    };
    if args.verbose {
        harness = harness.verbose();
    }

    let report = harness.run(&pool)?;
    if args.verbose {
        for perf in report.iter() {
            perf.print();
        }
    }
    report.print_report()?;

    Ok(())
}

fn duel(args: DuelArgs) -> anyhow::Result<()> {
    let pool = load(&args.pool)?;
    let player = args.player.build();

    let mut game = Game::duel(pool, args.opponent.build());
    let mut rng = match args.seed {
        Some(seed) => {
            game = game.seed(seed);
            StdRng::seed_from_u64(seed.wrapping_add(1))
        }
        None => StdRng::from_entropy(),
    };
    game.start(args.first.into())?;

    println!("{player} (player) against {}", args.opponent.build());
    let step = Duration::from_millis(250);
    let mut clock = Duration::ZERO;
    let limit = game.pool().len() * 4;

    let outcome: Outcome = loop {
        let session = game.session();
        if session.phase() == Phase::Playing
            && session.turn() == Author::Player
            && !game.revealing()
        {
            let id = player.choose(game.pool(), session.history(), &mut rng).entity.id;
            let record = game.guess(id)?;
            println!(
                "[{:>6.2}s] player guessed {}: {}",
                clock.as_secs_f32(),
                record.entity,
                record.verdict
            );
        }

        let mut over = None;
        for event in game.advance(step) {
            match event {
                Event::Guessed { id, author } => {
                    if let Some(record) = game.session().history().iter().find(|r| r.id == id) {
                        println!(
                            "[{:>6.2}s] {author} guessed {}: {}",
                            clock.as_secs_f32(),
                            record.entity,
                            record.verdict
                        );
                    }
                }
                Event::GameOver(outcome) => over = Some(outcome),
                other => debug!("{other:?}"),
            }
        }
        if let Some(outcome) = over {
            break outcome;
        }

        if game.session().history().len() > limit {
            bail!("no winner after {limit} guesses");
        }
        clock += step;
        if args.realtime {
            thread::sleep(step);
        }
    };

    println!(
        "{} won after {} guesses ({} of them its own), the target was {}",
        outcome.winner,
        outcome.guesses,
        outcome.winner_guesses,
        game.session().target()
    );

    let store = MemoryStore::new();
    let (facts, claim) = facts_for(&outcome, store.current()?.as_ref());
    for fact in facts.iter() {
        store.record(fact)?;
    }
    if let Some(claim) = claim {
        store.record(&claim.with_holder(&player.to_string()))?;
    }
    if let Some(record) = store.current()? {
        info!("global record is now {record:?}");
    }

    if let Some(path) = args.save {
        fs::write(&path, game.session().snapshot().to_json()?)
            .with_context(|| format!("failed to save the session to {}", path.display()))?;
    }

    game.exit();
    Ok(())
}
